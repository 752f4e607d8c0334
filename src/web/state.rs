//! Shared state handed to every web handler.

use std::sync::Arc;

use super::rate_limit::RateLimiter;
use crate::bundle::{BundleService, WorkspaceAllocator};
use crate::capture::{BoundedRenderer, ChromeRenderer};
use crate::config::Config;

/// Cloned into each request; holds no per-request data.
#[derive(Clone)]
pub struct WebAppState {
    service: BundleService,
    rate_limiter: Option<Arc<RateLimiter>>,
}

impl WebAppState {
    pub fn new(service: BundleService) -> Self {
        Self {
            service,
            rate_limiter: None,
        }
    }

    /// Wire the production stack: headless Chrome behind a concurrency bound.
    pub fn from_config(config: &Config) -> Self {
        let renderer = BoundedRenderer::new(
            ChromeRenderer::new(config.capture.clone()),
            config.capture.max_concurrent,
        )
        .with_queue_timeout(config.capture.queue_timeout);

        let service = BundleService::new(
            Arc::new(renderer),
            WorkspaceAllocator::new(&config.work_root),
            config.capture.timeout,
        );

        let state = Self::new(service);
        if config.rate_limit.enabled {
            state.with_rate_limiter(RateLimiter::from_config(&config.rate_limit))
        } else {
            state
        }
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(Arc::new(limiter));
        self
    }

    pub fn service(&self) -> &BundleService {
        &self.service
    }

    pub fn rate_limiter(&self) -> Option<&Arc<RateLimiter>> {
        self.rate_limiter.as_ref()
    }
}
