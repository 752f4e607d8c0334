//! Zip archiving of a workspace directory.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::CompressionMethod;

use super::error::BundleError;

/// Highest deflate level
const COMPRESSION_LEVEL: i32 = 9;

/// Compress every file under `dir` into a zip at `out`.
///
/// Entry names are relative to `dir` and use `/` separators, so the files
/// sit at the archive root. Returns the archive size in bytes. `out` must not
/// live inside `dir`.
pub fn create_archive(dir: &Path, out: &Path) -> Result<u64, BundleError> {
    let zip_file =
        File::create(out).map_err(|e| BundleError::Archive(format!("create archive: {e}")))?;
    let mut zip = zip::ZipWriter::new(zip_file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL));

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .sort_by_file_name()
        .follow_links(false);

    for entry in walker {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| BundleError::Archive(e.to_string()))?;
        let name = entry_name(relative)?;

        if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else if entry.file_type().is_file() {
            zip.start_file(name, options)?;
            let mut src = File::open(entry.path())
                .map_err(|e| BundleError::Archive(format!("read {}: {e}", relative.display())))?;
            io::copy(&mut src, &mut zip)
                .map_err(|e| BundleError::Archive(format!("compress {}: {e}", relative.display())))?;
        }
    }

    let mut zip_file = zip.finish()?;
    zip_file
        .flush()
        .map_err(|e| BundleError::Archive(format!("flush archive: {e}")))?;

    let size = zip_file
        .metadata()
        .map_err(|e| BundleError::Archive(format!("stat archive: {e}")))?
        .len();
    Ok(size)
}

fn entry_name(relative: &Path) -> Result<String, BundleError> {
    let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    parts
        .map(|p| p.join("/"))
        .ok_or_else(|| BundleError::Archive(format!("non UTF-8 path: {}", relative.display())))
}
