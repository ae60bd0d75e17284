//! Embedded chat page assets
//!
//! In development, falls back to serving from the `ui/` directory.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::Embed;
use std::path::PathBuf;

#[derive(Embed)]
#[folder = "ui"]
struct Assets;

/// Serve embedded static files, with filesystem fallback for development
pub async fn serve_static(req: Request<Body>) -> Response {
    let path = req
        .uri()
        .path()
        .trim_start_matches("/assets/")
        .trim_start_matches('/');

    if path.split('/').any(|segment| segment == "..") {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    }

    let mime = mime_guess::from_path(path).first_or_octet_stream();

    if let Some(content) = Assets::get(path) {
        return (
            [(header::CONTENT_TYPE, mime.as_ref().to_string())],
            content.data.into_owned(),
        )
            .into_response();
    }

    let fs_path = PathBuf::from("ui").join(path);
    if let Ok(content) = tokio::fs::read(&fs_path).await {
        return ([(header::CONTENT_TYPE, mime.as_ref().to_string())], content).into_response();
    }

    (StatusCode::NOT_FOUND, "Not found").into_response()
}

/// Get the index.html content (embedded or from filesystem)
pub fn get_index_html() -> Option<String> {
    if let Some(content) = Assets::get("index.html") {
        return String::from_utf8(content.data.into_owned()).ok();
    }

    std::fs::read_to_string("ui/index.html").ok()
}
