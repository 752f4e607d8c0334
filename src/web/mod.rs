//! HTTP surface: router, middleware and handlers.

pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod server;
pub mod state;

pub use error::WebError;
pub use rate_limit::{RateDecision, RateLimiter};
pub use server::{build_router, run_server};
pub use state::WebAppState;
