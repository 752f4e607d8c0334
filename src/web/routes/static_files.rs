//! Embedded upload form and its assets.

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "assets/public/"]
struct PublicAssets;

/// Serve the upload form.
pub async fn serve_index() -> Response {
    match PublicAssets::get("index.html") {
        Some(content) => Html(content.data.into_owned()).into_response(),
        None => (StatusCode::NOT_FOUND, "Upload form not found").into_response(),
    }
}

/// Serve a file referenced by the upload form.
pub async fn serve_static_file(Path(path): Path<String>) -> Response {
    match PublicAssets::get(&path) {
        Some(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
