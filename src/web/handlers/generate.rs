use std::io;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use tokio_util::io::ReaderStream;

use crate::bundle::{BundleError, GenerateRequest, GeneratedBundle};
use crate::web::error::WebError;
use crate::web::state::WebAppState;

/// `POST /generate-app`: capture a page and return it as a zipped app shell.
pub async fn generate_app(
    State(state): State<WebAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebError> {
    let payload = parse_body(&headers, &body)?;

    let request = payload.validate()?;
    tracing::info!(app = %request.sanitized_name, url = %request.url, "Generating app bundle");

    let bundle = state.service().generate(request).await?;

    let file = tokio::fs::File::open(bundle.archive_path())
        .await
        .map_err(BundleError::Transfer)?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        bundle.download_name()
    ))
    .map_err(|e| WebError::Internal(format!("invalid download name: {e}")))?;
    let length = HeaderValue::from(bundle.size());
    let workspace = bundle.workspace().name().to_string();

    // The stream owns the bundle; the workspace and archive are removed when
    // the body is dropped, whether it finished or the client went away.
    let release = ReleaseOnDrop(Some(bundle));
    let stream = ReaderStream::new(file).map(move |chunk| {
        let _owner = &release;
        chunk.map_err(|e| {
            let kind = e.kind();
            let err = BundleError::Transfer(e);
            tracing::error!(
                workspace = %workspace,
                error_kind = err.kind(),
                error = %err,
                "Archive stream failed"
            );
            io::Error::new(kind, err.to_string())
        })
    });

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/zip")),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, length),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

/// Decode the request body.
///
/// A body that is empty or not declared as JSON carries no fields at all, so
/// it fails validation as missing fields. Declared JSON that does not parse is
/// a bad request.
fn parse_body(headers: &HeaderMap, body: &[u8]) -> Result<GenerateRequest, WebError> {
    if !is_json(headers) || body.trim_ascii().is_empty() {
        return Ok(GenerateRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected request body");
        WebError::BadRequest("Invalid request body".into())
    })
}

fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case("application/json")
        || (essence.len() > 5 && essence[essence.len() - 5..].eq_ignore_ascii_case("+json"))
}

/// Removes a finished bundle on the blocking pool once the body is dropped.
struct ReleaseOnDrop(Option<GeneratedBundle>);

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        let Some(bundle) = self.0.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                // If the pool is shutting down the closure is dropped unrun,
                // which still drops the bundle.
                handle.spawn_blocking(move || drop(bundle));
            }
            Err(_) => drop(bundle),
        }
    }
}
