//! Page capture: render a URL in an isolated browser session and return its markup.

pub mod bounded;
pub mod chrome;
pub mod mock;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

pub use bounded::BoundedRenderer;
pub use chrome::ChromeRenderer;
pub use mock::{MockOutcome, MockRenderer};

/// Serialized DOM of a rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPage(String);

impl CapturedPage {
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Errors that can occur while capturing a page
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("page did not settle within {0:?}")]
    Timeout(Duration),

    #[error("rendering engine unavailable: {0}")]
    Unavailable(String),
}

/// Capability for turning a URL into rendered markup
///
/// Every call must run in its own browsing context so that cookies and
/// storage never leak between requests.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn capture(&self, url: &Url, timeout: Duration) -> Result<CapturedPage, CaptureError>;
}
