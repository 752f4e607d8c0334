//! Mock renderer for deterministic testing
//!
//! Implements [`PageRenderer`] without launching a browser. Use this for
//! integration tests that need to drive the whole bundle pipeline.
//!
//! # Example
//! ```no_run
//! use webapp_bundler::capture::{MockOutcome, MockRenderer};
//! use std::time::Duration;
//!
//! let renderer = MockRenderer::new(MockOutcome::Page("<h1>Hello</h1>".into()))
//!     .with_delay(Duration::from_millis(10));
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Url;

use super::{CaptureError, CapturedPage, PageRenderer};

/// What the mock returns for every capture
#[derive(Clone, Debug)]
pub enum MockOutcome {
    Page(String),
    Navigation(String),
    Timeout,
    Unavailable(String),
}

impl Default for MockOutcome {
    fn default() -> Self {
        MockOutcome::Page("<h1>Mock page</h1>".into())
    }
}

/// Mock renderer for testing
///
/// Records every requested URL and the highest number of captures that were
/// in flight at the same time.
#[derive(Default)]
pub struct MockRenderer {
    outcome: MockOutcome,
    delay: Duration,
    captured_urls: Arc<Mutex<Vec<Url>>>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl MockRenderer {
    pub fn new(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            ..Self::default()
        }
    }

    /// Simulated render time (default: Duration::ZERO)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.captured_urls.lock().len()
    }

    pub fn captured_urls(&self) -> Vec<Url> {
        self.captured_urls.lock().clone()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageRenderer for MockRenderer {
    async fn capture(&self, url: &Url, timeout: Duration) -> Result<CapturedPage, CaptureError> {
        self.captured_urls.lock().push(url.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match &self.outcome {
            MockOutcome::Page(markup) => Ok(CapturedPage::new(markup.clone())),
            MockOutcome::Navigation(msg) => Err(CaptureError::Navigation(msg.clone())),
            MockOutcome::Timeout => Err(CaptureError::Timeout(timeout)),
            MockOutcome::Unavailable(msg) => Err(CaptureError::Unavailable(msg.clone())),
        }
    }
}
