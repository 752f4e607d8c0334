//! Request orchestration: validate, allocate, capture, synthesize, archive.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Url;
use serde::Deserialize;
use tracing::Instrument;

use super::archive::create_archive;
use super::error::BundleError;
use super::synth::{write_bundle, BundleFiles};
use super::workspace::{Workspace, WorkspaceAllocator};
use crate::capture::{CapturedPage, PageRenderer};
use crate::util::names::{download_file_name, sanitize_app_name};

pub const MISSING_FIELDS: &str = "Missing required fields";
pub const INVALID_URL: &str = "Invalid website URL";

/// Request body of `POST /generate-app`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub app_name: Option<String>,
    pub website_url: Option<String>,
}

/// A request that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    /// Name as the user typed it (trimmed); shown inside the app
    pub app_name: String,
    /// Filesystem-safe form of the name
    pub sanitized_name: String,
    pub url: Url,
}

impl GenerateRequest {
    pub fn new(app_name: impl Into<String>, website_url: impl Into<String>) -> Self {
        Self {
            app_name: Some(app_name.into()),
            website_url: Some(website_url.into()),
        }
    }

    pub fn validate(&self) -> Result<ValidatedRequest, BundleError> {
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let (Some(app_name), Some(raw_url)) =
            (non_blank(&self.app_name), non_blank(&self.website_url))
        else {
            return Err(BundleError::Validation(MISSING_FIELDS.into()));
        };

        let url = parse_website_url(&raw_url)?;
        let sanitized_name =
            sanitize_app_name(&app_name).ok_or_else(|| BundleError::InvalidName(app_name.clone()))?;

        Ok(ValidatedRequest {
            app_name,
            sanitized_name,
            url,
        })
    }
}

/// Accept absolute http(s) URLs with a host
fn parse_website_url(raw: &str) -> Result<Url, BundleError> {
    let url = Url::parse(raw).map_err(|_| BundleError::Validation(INVALID_URL.into()))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some_and(|h| !h.is_empty()) => Ok(url),
        _ => Err(BundleError::Validation(INVALID_URL.into())),
    }
}

/// A finished archive plus the workspace guard that owns it
///
/// Dropping this removes the workspace directory and the archive.
#[derive(Debug)]
pub struct GeneratedBundle {
    workspace: Workspace,
    download_name: String,
    size: u64,
}

impl GeneratedBundle {
    pub fn archive_path(&self) -> &Path {
        self.workspace.archive_path()
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Suggested file name for the download (`<name>.zip`)
    pub fn download_name(&self) -> &str {
        &self.download_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Runs the bundle pipeline for one request at a time; cheap to clone.
#[derive(Clone)]
pub struct BundleService {
    renderer: Arc<dyn PageRenderer>,
    allocator: WorkspaceAllocator,
    capture_timeout: Duration,
}

impl BundleService {
    pub fn new(
        renderer: Arc<dyn PageRenderer>,
        allocator: WorkspaceAllocator,
        capture_timeout: Duration,
    ) -> Self {
        Self {
            renderer,
            allocator,
            capture_timeout,
        }
    }

    pub fn allocator(&self) -> &WorkspaceAllocator {
        &self.allocator
    }

    /// Run every stage. On error the workspace is already gone when this returns.
    pub async fn generate(&self, request: ValidatedRequest) -> Result<GeneratedBundle, BundleError> {
        let started = Instant::now();
        let workspace = self.allocator.allocate(&request.sanitized_name)?;
        let span = tracing::info_span!("bundle", workspace = %workspace.name());

        // Any early return drops `workspace`, which removes it from disk.
        let captured = self
            .capture_stage(&request)
            .instrument(span.clone())
            .await?;

        let files = BundleFiles::render(&request.app_name, &request.sanitized_name, &captured)
            .map_err(|e| log_stage("synthesize", e))?;

        // The guard moves into the blocking task so that, even if this future
        // is dropped mid-write, removal waits until the task stops touching disk.
        let (workspace, size) = tokio::task::spawn_blocking(move || {
            let _enter = span.enter();
            write_bundle(workspace.dir(), &files).map_err(|e| log_stage("synthesize", e))?;
            let size = create_archive(workspace.dir(), workspace.archive_path())
                .map_err(|e| log_stage("archive", e))?;
            Ok::<_, BundleError>((workspace, size))
        })
        .await
        .map_err(|e| log_stage("archive", BundleError::Archive(e.to_string())))??;

        tracing::info!(
            workspace = %workspace.name(),
            size,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Bundle ready"
        );

        Ok(GeneratedBundle {
            download_name: download_file_name(&request.sanitized_name),
            workspace,
            size,
        })
    }

    async fn capture_stage(&self, request: &ValidatedRequest) -> Result<CapturedPage, BundleError> {
        tracing::info!(url = %request.url, stage = "capture", "Capturing page");
        let captured = self
            .renderer
            .capture(&request.url, self.capture_timeout)
            .await
            .map_err(|e| log_stage("capture", e.into()))?;
        tracing::debug!(bytes = captured.len(), "Captured page");
        Ok(captured)
    }
}

fn log_stage(stage: &'static str, err: BundleError) -> BundleError {
    tracing::error!(stage, error_kind = err.kind(), error = %err, "Bundle stage failed");
    err
}
