//! Headless Chrome renderer.
//!
//! Each capture launches its own browser process with a throwaway profile,
//! which is the strongest isolation headless_chrome offers. The blocking
//! DevTools calls run on tokio's blocking pool.
//!
//! A page counts as settled once Chrome reports the `networkIdle` lifecycle
//! event for the navigated document (no network connections for 500 ms).
//! Every step shares one deadline, so the whole capture, launch included,
//! stays within the requested timeout.

use std::ffi::OsStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use headless_chrome::protocol::cdp::types::Event;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::util::Wait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use reqwest::Url;

use super::{CaptureError, CapturedPage, PageRenderer};
use crate::config::CaptureConfig;

/// Extra time granted to the blocking task past the deadline so browser
/// shutdown is not reported as a page timeout.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Lifecycle event Chrome emits when a new document starts loading
const LIFECYCLE_INIT: &str = "init";
/// Lifecycle event Chrome emits once the network has been quiet for 500 ms
const LIFECYCLE_NETWORK_IDLE: &str = "networkIdle";

const IDLE_POLL: Duration = Duration::from_millis(50);

pub struct ChromeRenderer {
    config: CaptureConfig,
}

impl ChromeRenderer {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config }
    }

    fn launch_options(&self, timeout: Duration) -> Result<LaunchOptions<'static>, CaptureError> {
        LaunchOptions::default_builder()
            .headless(true)
            .sandbox(self.config.sandbox)
            .window_size(Some(self.config.window_size))
            .path(self.config.chrome_path.clone())
            .idle_browser_timeout(timeout + SHUTDOWN_GRACE)
            .args(vec![
                OsStr::new("--disable-extensions"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--no-first-run"),
            ])
            .build()
            .map_err(|e| CaptureError::Unavailable(e.to_string()))
    }
}

/// Time left before `deadline`, or a timeout error once it has passed
fn remaining(deadline: Instant, timeout: Duration) -> Result<Duration, CaptureError> {
    match deadline.checked_duration_since(Instant::now()) {
        Some(left) if !left.is_zero() => Ok(left),
        _ => Err(CaptureError::Timeout(timeout)),
    }
}

/// Map a DevTools failure to a capture error
fn classify_failure(err: anyhow::Error, timeout: Duration) -> CaptureError {
    if err.downcast_ref::<headless_chrome::util::Timeout>().is_some() {
        CaptureError::Timeout(timeout)
    } else {
        CaptureError::Navigation(format!("{err:#}"))
    }
}

/// Track the `networkIdle` lifecycle event of the most recent document
fn watch_network_idle(tab: &Tab) -> anyhow::Result<Arc<AtomicBool>> {
    let idle = Arc::new(AtomicBool::new(false));
    let flag = idle.clone();

    tab.add_event_listener(Arc::new(move |event: &Event| {
        if let Event::PageLifecycleEvent(lifecycle) = event {
            match lifecycle.params.name.as_str() {
                LIFECYCLE_INIT => flag.store(false, Ordering::SeqCst),
                LIFECYCLE_NETWORK_IDLE => flag.store(true, Ordering::SeqCst),
                _ => {}
            }
        }
    }))?;
    tab.call_method(Page::SetLifecycleEventsEnabled { enabled: true })?;

    Ok(idle)
}

/// Run one capture in a fresh browser. Blocking.
fn capture_blocking(
    options: LaunchOptions<'static>,
    url: &str,
    timeout: Duration,
    user_agent: Option<&str>,
) -> Result<String, CaptureError> {
    let deadline = Instant::now() + timeout;

    let browser = Browser::new(options).map_err(|e| CaptureError::Unavailable(format!("{e:#}")))?;
    let tab = browser
        .new_tab()
        .map_err(|e| CaptureError::Unavailable(format!("{e:#}")))?;

    if let Some(ua) = user_agent {
        tab.set_user_agent(ua, None, None)
            .map_err(|e| CaptureError::Unavailable(format!("{e:#}")))?;
    }
    let idle = watch_network_idle(&tab).map_err(|e| CaptureError::Unavailable(format!("{e:#}")))?;

    tab.set_default_timeout(remaining(deadline, timeout)?);
    tab.navigate_to(url)
        .map_err(|e| classify_failure(e, timeout))?;

    tab.set_default_timeout(remaining(deadline, timeout)?);
    tab.wait_until_navigated()
        .map_err(|e| classify_failure(e, timeout))?;

    Wait::new(remaining(deadline, timeout)?, IDLE_POLL)
        .until(|| idle.load(Ordering::SeqCst).then_some(()))
        .map_err(|_| CaptureError::Timeout(timeout))?;

    tab.set_default_timeout(remaining(deadline, timeout)?);
    tab.get_content().map_err(|e| classify_failure(e, timeout))
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    async fn capture(&self, url: &Url, timeout: Duration) -> Result<CapturedPage, CaptureError> {
        let options = self.launch_options(timeout)?;
        let target = url.to_string();
        let user_agent = self.config.user_agent.clone();

        tracing::debug!(url = %target, ?timeout, "Launching headless browser");

        let mut task = tokio::task::spawn_blocking(move || {
            capture_blocking(options, &target, timeout, user_agent.as_deref())
        });

        let joined = match tokio::time::timeout(timeout + SHUTDOWN_GRACE, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                // Only return once the browser is gone, so a concurrency
                // bound around this renderer keeps counting it.
                tracing::warn!(
                    url = %url,
                    ?timeout,
                    "Capture overran its deadline, waiting for browser shutdown"
                );
                let _ = task.await;
                return Err(CaptureError::Timeout(timeout));
            }
        };

        match joined {
            Ok(result) => result.map(CapturedPage::new),
            Err(join_err) => Err(CaptureError::Unavailable(format!(
                "capture task failed: {}",
                join_err
            ))),
        }
    }
}
