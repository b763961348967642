use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::storage::{BlobStore, ContentHash};
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

const IMAGE_SUFFIX: &str = ".png";
const IMAGE_CONTENT_TYPE: &str = "image/png";

/// What a `GET /{name}` request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureView {
    /// `/<hash>.png`: the stored bytes.
    Image,
    /// `/<hash>`: an HTML page embedding the image.
    Page,
}

/// Split the last path segment into a content hash and the requested view.
///
/// Keys are restricted to `[a-z0-9]+`, and must also be a well-formed hash.
pub fn parse_picture_path(segment: &str) -> Option<(ContentHash, PictureView)> {
    let (key, view) = match segment.strip_suffix(IMAGE_SUFFIX) {
        Some(key) => (key, PictureView::Image),
        None => (segment, PictureView::Page),
    };

    if key.is_empty()
        || !key
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    {
        return None;
    }

    ContentHash::from_hex(key).ok().map(|hash| (hash, view))
}

#[instrument(skip(state, headers))]
pub async fn get_picture(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let (hash, view) =
        parse_picture_path(&name).ok_or_else(|| AppError::NotFound("No picture is found".into()))?;

    match view {
        PictureView::Image => serve_image(&*state.blob_store, &hash, &headers).await,
        PictureView::Page => serve_page(&*state.blob_store, &hash).await,
    }
}

async fn serve_image(
    blob_store: &dyn BlobStore,
    hash: &ContentHash,
    headers: &HeaderMap,
) -> Result<Response, AppError> {
    let etag_value = format!("\"{}\"", hash.to_hex());
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && etag_matches(val, &etag_value)
        && blob_store.exists(hash).await?
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let body = blob_store.get(hash).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, IMAGE_CONTENT_TYPE)
        .header(header::CONTENT_LENGTH, body.len().to_string())
        .header(header::ETAG, &etag_value)
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from(body))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

async fn serve_page(blob_store: &dyn BlobStore, hash: &ContentHash) -> Result<Response, AppError> {
    // Don't hand out a page whose image would 404.
    if !blob_store.exists(hash).await? {
        return Err(AppError::NotFound("No picture is found".into()));
    }

    Ok((
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        viewer_html(hash),
    )
        .into_response())
}

/// Weak comparison of an `If-None-Match` list against `etag`.
fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match.split(',').map(str::trim).any(|tag| {
        tag == "*" || tag.strip_prefix("W/").unwrap_or(tag) == etag
    })
}

fn viewer_html(hash: &ContentHash) -> String {
    format!(r#"<img src="/{hash}{IMAGE_SUFFIX}">"#)
}
