//! Work root and renderer fixtures

use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::Router;
use reqwest::Url;
use tempfile::TempDir;

use webapp_bundler::capture::{CaptureError, CapturedPage, PageRenderer};
use webapp_bundler::config::ServerSettings;
use webapp_bundler::{build_router, BundleService, WebAppState, WorkspaceAllocator};

pub const CAPTURE_TIMEOUT: Duration = Duration::from_secs(5);

/// A temporary work root that tests can inspect for leftovers
pub struct WorkRoot {
    dir: TempDir,
}

impl WorkRoot {
    pub fn new() -> Self {
        let dir = tempfile::Builder::new()
            .prefix("webapp-bundler-it-")
            .tempdir()
            .expect("Failed to create work root");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Every entry currently under the root
    pub fn entries(&self) -> Vec<PathBuf> {
        fs::read_dir(self.path())
            .expect("Failed to read work root")
            .map(|e| e.expect("Failed to read entry").path())
            .collect()
    }

    pub fn assert_empty(&self) {
        let entries = self.entries();
        assert!(entries.is_empty(), "leftover artifacts: {:?}", entries);
    }

    /// Wait for removals handed to the blocking pool, then assert emptiness
    pub async fn wait_until_empty(&self) {
        for _ in 0..100 {
            if self.entries().is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.assert_empty();
    }

    pub fn service(&self, renderer: Arc<dyn PageRenderer>) -> BundleService {
        BundleService::new(
            renderer,
            WorkspaceAllocator::new(self.path()),
            CAPTURE_TIMEOUT,
        )
    }

    pub fn router(&self, renderer: Arc<dyn PageRenderer>) -> Router {
        let state = WebAppState::new(self.service(renderer));
        build_router(state, &ServerSettings::default())
    }
}

/// How a [`SabotageRenderer`] breaks the workspace during capture
#[derive(Debug, Clone, Copy)]
pub enum Sabotage {
    /// Delete the workspace directory so writing files fails
    RemoveWorkspace,
    /// Put a directory where the archive should go so archiving fails
    BlockArchive,
}

/// Returns a page, but first damages the (single) workspace under `root`
pub struct SabotageRenderer {
    root: PathBuf,
    sabotage: Sabotage,
}

impl SabotageRenderer {
    pub fn new(root: &Path, sabotage: Sabotage) -> Self {
        Self {
            root: root.to_path_buf(),
            sabotage,
        }
    }
}

#[async_trait]
impl PageRenderer for SabotageRenderer {
    async fn capture(&self, _url: &Url, _timeout: Duration) -> Result<CapturedPage, CaptureError> {
        let workspace = fs::read_dir(&self.root)
            .expect("Failed to read work root")
            .map(|e| e.expect("Failed to read entry").path())
            .find(|p| p.is_dir())
            .expect("No workspace allocated before capture");

        match self.sabotage {
            Sabotage::RemoveWorkspace => fs::remove_dir_all(&workspace).unwrap(),
            Sabotage::BlockArchive => {
                let mut archive = workspace.into_os_string();
                archive.push(".zip");
                fs::create_dir(PathBuf::from(archive)).unwrap();
            }
        }

        Ok(CapturedPage::new("<p>sabotaged</p>"))
    }
}

pub fn generate_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/generate-app")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

/// Sorted entry names of an in-memory zip
pub fn zip_entries(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).expect("Invalid zip");
    let mut names: Vec<String> = archive.file_names().map(String::from).collect();
    names.sort();
    names
}

/// Read one entry of an in-memory zip as text
pub fn zip_text(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).expect("Invalid zip");
    let mut entry = archive.by_name(name).expect("Missing zip entry");
    let mut out = String::new();
    entry.read_to_string(&mut out).expect("Entry is not UTF-8");
    out
}
