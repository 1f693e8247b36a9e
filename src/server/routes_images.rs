//! Event image API routes.
//!
//! Upload, list, fetch and delete images of an event, plus serving of the
//! stored blobs under the static URL prefix. Coordinator calls block on
//! SQLite and the filesystem, so they run on the blocking pool.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use eventimg_common::{Error, EventId, ImageId, Tier, OUTPUT_MIME};
use serde::Deserialize;
use std::io::Read;

use super::error::AppError;
use super::AppContext;
use crate::images::codec::mime_from_path;
use crate::images::{AssetDescriptor, Upload};

/// Create image-related routes.
pub fn image_routes() -> Router<AppContext> {
    Router::new()
        .route(
            "/events/:event_id/images",
            get(list_images).post(upload_image),
        )
        .route(
            "/events/:event_id/images/:image_id",
            get(get_image).delete(delete_image),
        )
}

// ============================================================================
// Request types
// ============================================================================

/// Query parameters of the upload endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub primary: bool,
    /// Tier name; defaults to `compressed`.
    pub tier: Option<String>,
}

struct FilePart {
    file_name: String,
    content_type: String,
    data: bytes::Bytes,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/events/:event_id/images
async fn upload_image(
    State(ctx): State<AppContext>,
    Path(event_id): Path<String>,
    Query(query): Query<UploadQuery>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let event_id: EventId = event_id.parse()?;
    let tier = match query.tier.as_deref() {
        Some(name) => name.parse::<Tier>()?,
        None => Tier::default(),
    };
    let part = read_file_part(multipart, ctx.config.images.max_upload_bytes).await?;

    tracing::debug!(
        %event_id,
        %tier,
        file_name = %part.file_name,
        content_type = %part.content_type,
        bytes = part.data.len(),
        "upload received"
    );

    let coordinator = ctx.coordinator.clone();
    let is_primary = query.primary;
    let descriptor = tokio::task::spawn_blocking(move || {
        coordinator.create(
            event_id,
            Upload {
                data: &part.data,
                declared_mime: &part.content_type,
                file_name: &part.file_name,
                tier,
                is_primary,
            },
        )
    })
    .await??;

    Ok((StatusCode::CREATED, Json(descriptor)))
}

/// Pull the `file` field out of a multipart body.
async fn read_file_part(mut multipart: Multipart, limit: usize) -> Result<FilePart, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .map(str::to_string)
            .or_else(|| mime_from_path(std::path::Path::new(&file_name)).map(str::to_string))
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let data = field.bytes().await.map_err(|e| multipart_error(e, limit))?;

        return Ok(FilePart {
            file_name,
            content_type,
            data,
        });
    }

    Err(Error::validation("multipart field 'file' is required").into())
}

fn multipart_error(e: axum::extract::multipart::MultipartError, limit: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        // The body was cut off at the request limit; its full size is unknown.
        return Error::PayloadTooLarge {
            size: limit + 1,
            limit,
        }
        .into();
    }
    Error::validation(format!("invalid multipart body: {}", e.body_text())).into()
}

/// GET /api/v1/events/:event_id/images
async fn list_images(
    State(ctx): State<AppContext>,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<AssetDescriptor>>, AppError> {
    let event_id: EventId = event_id.parse()?;
    let coordinator = ctx.coordinator.clone();
    let images = tokio::task::spawn_blocking(move || coordinator.list(event_id)).await??;
    Ok(Json(images))
}

/// GET /api/v1/events/:event_id/images/:image_id
async fn get_image(
    State(ctx): State<AppContext>,
    Path((event_id, image_id)): Path<(String, String)>,
) -> Result<Json<AssetDescriptor>, AppError> {
    let event_id: EventId = event_id.parse()?;
    let image_id: ImageId = image_id.parse()?;
    let coordinator = ctx.coordinator.clone();
    let image = tokio::task::spawn_blocking(move || coordinator.get(event_id, image_id)).await??;
    Ok(Json(image))
}

/// DELETE /api/v1/events/:event_id/images/:image_id
async fn delete_image(
    State(ctx): State<AppContext>,
    Path((event_id, image_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let event_id: EventId = event_id.parse()?;
    let image_id: ImageId = image_id.parse()?;
    let coordinator = ctx.coordinator.clone();
    tokio::task::spawn_blocking(move || coordinator.delete(event_id, image_id)).await??;

    Ok(Json(serde_json::json!({
        "message": "Image deleted successfully"
    })))
}

/// GET {static_url_prefix}/*path
///
/// Blobs never change once written, so they are served as immutable.
pub async fn serve_blob(
    State(ctx): State<AppContext>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let coordinator = ctx.coordinator.clone();
    let data = tokio::task::spawn_blocking(move || -> eventimg_common::Result<Vec<u8>> {
        let mut reader = coordinator.open_blob(&path)?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(data)
    })
    .await??;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, OUTPUT_MIME),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        data,
    ))
}
