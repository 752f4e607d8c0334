use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::capture::CaptureError;

/// Errors produced while turning a request into a bundle archive
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// Bad or missing input from the caller.
    #[error("{0}")]
    Validation(String),

    /// App name reduced to nothing after sanitization.
    #[error("Invalid app name: {0:?}")]
    InvalidName(String),

    #[error("Failed to load page: {0}")]
    Navigation(String),

    #[error("Page did not settle within {0:?}")]
    CaptureTimeout(Duration),

    #[error("Rendering engine unavailable: {0}")]
    RendererUnavailable(String),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create archive: {0}")]
    Archive(String),

    #[error("Failed to stream archive: {0}")]
    Transfer(#[source] io::Error),
}

impl BundleError {
    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BundleError::Write {
            path: path.into(),
            source,
        }
    }

    /// Stable label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            BundleError::Validation(_) => "validation",
            BundleError::InvalidName(_) => "invalid_name",
            BundleError::Navigation(_) => "navigation",
            BundleError::CaptureTimeout(_) => "capture_timeout",
            BundleError::RendererUnavailable(_) => "renderer_unavailable",
            BundleError::Write { .. } => "write",
            BundleError::Archive(_) => "archive",
            BundleError::Transfer(_) => "transfer",
        }
    }

    /// Whether the caller is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BundleError::Validation(_) | BundleError::InvalidName(_)
        )
    }
}

impl From<CaptureError> for BundleError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::Navigation(msg) => BundleError::Navigation(msg),
            CaptureError::Timeout(d) => BundleError::CaptureTimeout(d),
            CaptureError::Unavailable(msg) => BundleError::RendererUnavailable(msg),
        }
    }
}

impl From<zip::result::ZipError> for BundleError {
    fn from(err: zip::result::ZipError) -> Self {
        BundleError::Archive(err.to_string())
    }
}

impl From<walkdir::Error> for BundleError {
    fn from(err: walkdir::Error) -> Self {
        BundleError::Archive(err.to_string())
    }
}
