use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderMap, StatusCode, header};
use common::storage::{ContentHash, ContentHasher};
use tracing::{info, instrument};

use crate::config::{LinkTarget, ServerConfig, UploadConfig};
use crate::error::AppError;
use crate::state::AppState;

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "imagedata";

pub fn upload_body_limit(config: &UploadConfig) -> DefaultBodyLimit {
    DefaultBodyLimit::max(config.body_limit())
}

/// `POST /upload.cgi`: store the `imagedata` part and answer with its URL.
///
/// The whole form is read before anything is written, so a rejected or aborted
/// request never leaves a blob behind.
#[instrument(skip(state, headers, multipart))]
pub async fn upload_picture(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<String, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let max_size = state.config.upload.max_size;

    let mut image: Option<(ContentHash, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_size))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue; // Ignore unknown fields.
        }
        if image.is_some() {
            return Err(AppError::BadRequest(format!(
                "only one {IMAGE_FIELD} part is allowed"
            )));
        }
        image = Some(read_image_field(field, max_size).await?);
    }

    let (hash, data) =
        image.ok_or_else(|| AppError::BadRequest(format!("{IMAGE_FIELD} is required")))?;

    state.blob_store.put(&hash, &data).await?;

    info!(hash = %hash, size = data.len(), "Picture stored");

    Ok(picture_url(
        &state.config.server,
        state.config.upload.link_target,
        &headers,
        &hash,
    ))
}

/// Drain a field into memory, hashing as it streams and enforcing `max_size`.
async fn read_image_field(
    mut field: Field<'_>,
    max_size: u64,
) -> Result<(ContentHash, Vec<u8>), AppError> {
    let mut hasher = ContentHasher::new();
    let mut data = Vec::new();

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, max_size))?
    {
        if hasher.len() + chunk.len() as u64 > max_size {
            return Err(AppError::PayloadTooLarge { limit: max_size });
        }
        hasher.update(&chunk);
        data.extend_from_slice(&chunk);
    }

    Ok((hasher.finalize(), data))
}

fn multipart_error(err: MultipartError, max_size: u64) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { limit: max_size }
    } else {
        AppError::Internal(format!("Failed to read multipart body: {}", err.body_text()))
    }
}

/// Public URL of a stored picture.
fn picture_url(
    server: &ServerConfig,
    target: LinkTarget,
    headers: &HeaderMap,
    hash: &ContentHash,
) -> String {
    let base = match &server.public_url {
        Some(url) => url.trim_end_matches('/').to_string(),
        None => {
            let host = headers
                .get(header::HOST)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .unwrap_or_else(|| format!("localhost:{}", server.port));
            format!("http://{host}")
        }
    };

    match target {
        LinkTarget::Page => format!("{base}/{hash}"),
        LinkTarget::Image => format!("{base}/{hash}.png"),
    }
}
