//! Concurrency bound around any [`PageRenderer`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tokio::sync::Semaphore;

use super::{CaptureError, CapturedPage, PageRenderer};

/// Limits how many captures run at once.
///
/// Requests beyond the limit queue on a semaphore. With a queue timeout set,
/// a request that cannot get a slot in time fails as [`CaptureError::Timeout`]
/// without ever touching the inner renderer.
///
/// The permit travels with the capture into its own task, so a caller that
/// gives up early does not free the slot while the capture is still running.
pub struct BoundedRenderer<R> {
    inner: Arc<R>,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
    queue_timeout: Option<Duration>,
}

impl<R: PageRenderer + 'static> BoundedRenderer<R> {
    pub fn new(inner: R, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            inner: Arc::new(inner),
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            queue_timeout: None,
        }
    }

    pub fn with_queue_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.queue_timeout = timeout;
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Sessions currently free
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

#[async_trait]
impl<R: PageRenderer + 'static> PageRenderer for BoundedRenderer<R> {
    async fn capture(&self, url: &Url, timeout: Duration) -> Result<CapturedPage, CaptureError> {
        let acquire = self.permits.clone().acquire_owned();
        let permit = match self.queue_timeout {
            Some(wait) => match tokio::time::timeout(wait, acquire).await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::warn!(
                        url = %url,
                        max_concurrent = self.max_concurrent,
                        "Timed out waiting for a free capture session"
                    );
                    return Err(CaptureError::Timeout(wait));
                }
            },
            None => acquire.await,
        }
        .map_err(|_| CaptureError::Unavailable("capture pool closed".into()))?;

        let inner = self.inner.clone();
        let url = url.clone();
        tokio::spawn(async move {
            let _permit = permit;
            inner.capture(&url, timeout).await
        })
        .await
        .map_err(|e| CaptureError::Unavailable(format!("capture task failed: {e}")))?
    }
}
