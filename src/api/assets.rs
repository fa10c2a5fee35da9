//! Embedded site pages and static assets
//!
//! In development, falls back to serving from filesystem.

use axum::{
    body::Body,
    http::{header, Response, StatusCode},
};
use rust_embed::Embed;
use std::path::PathBuf;

#[derive(Embed)]
#[folder = "site"]
struct Site;

const SITE_DIR: &str = "site";

fn file_response(path: &str, content: Vec<u8>) -> Response<Body> {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let mut response = Response::new(Body::from(content));
    if let Ok(value) = header::HeaderValue::from_str(mime.as_ref()) {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    response
}

fn not_found() -> Response<Body> {
    let mut response = Response::new(Body::from("Not found"));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

/// Load a site file, embedded first, then from the working tree
pub fn load(path: &str) -> Option<Vec<u8>> {
    let path = path.trim_start_matches('/');
    if path.split('/').any(|segment| segment == "..") {
        return None;
    }

    if let Some(content) = Site::get(path) {
        return Some(content.data.into_owned());
    }

    let fs_path = PathBuf::from(SITE_DIR).join(path);
    std::fs::read(fs_path).ok()
}

/// Serve one site file with a guessed content type
pub fn serve(path: &str) -> Response<Body> {
    match load(path) {
        Some(content) => file_response(path, content),
        None => not_found(),
    }
}
