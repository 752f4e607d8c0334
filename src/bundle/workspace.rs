//! Per-request workspace directories.
//!
//! A [`Workspace`] owns both its directory and the archive built from it.
//! Dropping it removes both, on every exit path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::error::BundleError;
use crate::util::names::generate_workspace_name;

/// Creates uniquely named workspaces under a root directory
#[derive(Debug, Clone)]
pub struct WorkspaceAllocator {
    root: PathBuf,
}

impl WorkspaceAllocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate a fresh workspace for an already sanitized app name
    pub fn allocate(&self, sanitized_name: &str) -> Result<Workspace, BundleError> {
        fs::create_dir_all(&self.root).map_err(|e| BundleError::write(&self.root, e))?;

        let name = generate_workspace_name(sanitized_name);
        let dir = self.root.join(&name);
        // create_dir (not _all) so an existing path is an error, never shared.
        fs::create_dir(&dir).map_err(|e| BundleError::write(&dir, e))?;

        let archive_path = self.root.join(format!("{}.zip", name));
        tracing::debug!(workspace = %name, "Allocated workspace");

        Ok(Workspace {
            name,
            dir,
            archive_path,
        })
    }
}

/// A transient directory plus its sibling archive path
#[derive(Debug)]
pub struct Workspace {
    name: String,
    dir: PathBuf,
    archive_path: PathBuf,
}

impl Workspace {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Err(e) = remove_if_exists(&self.dir) {
            tracing::warn!(
                workspace = %self.name,
                path = %self.dir.display(),
                error = %e,
                "Failed to remove workspace directory"
            );
        }
        if let Err(e) = remove_if_exists(&self.archive_path) {
            tracing::warn!(
                workspace = %self.name,
                path = %self.archive_path.display(),
                error = %e,
                "Failed to remove archive"
            );
        }
        tracing::debug!(workspace = %self.name, "Released workspace");
    }
}

/// Remove a file or directory tree; a missing path is not an error
fn remove_if_exists(path: &Path) -> io::Result<()> {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) => Err(e),
    };
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
