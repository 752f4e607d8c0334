//! Web error types for the webapp-bundler server.

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::bundle::BundleError;

pub const INTERNAL_ERROR: &str = "Internal server error";
pub const RATE_LIMITED: &str = "Too many requests, please try again later.";

/// Error type for web API operations.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Bad request with validation error.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Client exceeded its request budget.
    #[error("Rate limited, retry after {0:?}")]
    TooManyRequests(Duration),

    /// Internal server error. The message is logged, never sent.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Bundle pipeline failure.
    #[error(transparent)]
    Bundle(#[from] BundleError),
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            WebError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            WebError::TooManyRequests(_) => (StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED.into()),
            WebError::Internal(msg) => {
                tracing::error!("Internal server error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR.into())
            }
            WebError::Bundle(e) if e.is_client_error() => (StatusCode::BAD_REQUEST, e.to_string()),
            WebError::Bundle(e) => {
                tracing::error!(error_kind = e.kind(), error = %e, "Bundle generation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR.into())
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });
        let mut response = (status, body).into_response();

        if let WebError::TooManyRequests(retry_after) = self {
            // Round up so clients never retry a moment too early.
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }

        response
    }
}

impl From<anyhow::Error> for WebError {
    fn from(err: anyhow::Error) -> Self {
        WebError::Internal(err.to_string())
    }
}
