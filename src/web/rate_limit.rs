//! Per-client fixed-window rate limiting.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;

use super::error::WebError;
use super::state::WebAppState;
use crate::config::RateLimitConfig;

/// Expired windows are swept once the table grows past this
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32, reset_after: Duration },
    Limited { retry_after: Duration },
}

/// Counts requests per IP in fixed windows
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clients: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window)
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn check(&self, ip: IpAddr) -> RateDecision {
        self.check_at(ip, Instant::now())
    }

    /// Count one request from `ip` at `now`
    pub fn check_at(&self, ip: IpAddr, now: Instant) -> RateDecision {
        let mut clients = self.clients.lock();

        if clients.len() > PRUNE_THRESHOLD {
            let window = self.window;
            clients.retain(|_, w| now.saturating_duration_since(w.started) < window);
        }

        let entry = clients.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.saturating_duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        let reset_after = self
            .window
            .saturating_sub(now.saturating_duration_since(entry.started));

        if entry.count >= self.max_requests {
            return RateDecision::Limited {
                retry_after: reset_after,
            };
        }

        entry.count += 1;
        RateDecision::Allowed {
            remaining: self.max_requests - entry.count,
            reset_after,
        }
    }

    /// Number of clients currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.clients.lock().len()
    }
}

/// Middleware enforcing the limiter on the routes it wraps
pub async fn enforce(State(state): State<WebAppState>, req: Request, next: Next) -> Response {
    let Some(limiter) = state.rate_limiter() else {
        return next.run(req).await;
    };

    // Without connection info (e.g. in-process tests) all callers share one bucket.
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    match limiter.check(ip) {
        RateDecision::Allowed {
            remaining,
            reset_after,
        } => {
            let mut response = next.run(req).await;
            let headers = response.headers_mut();
            headers.insert("ratelimit-limit", HeaderValue::from(limiter.max_requests()));
            headers.insert("ratelimit-remaining", HeaderValue::from(remaining));
            headers.insert("ratelimit-reset", HeaderValue::from(reset_after.as_secs()));
            response
        }
        RateDecision::Limited { retry_after } => {
            tracing::warn!(client = %ip, ?retry_after, "Rate limit exceeded");
            WebError::TooManyRequests(retry_after).into_response()
        }
    }
}
