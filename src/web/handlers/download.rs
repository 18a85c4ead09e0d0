//! Download handlers: single file and whole-group ZIP.

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::Response,
};
use std::sync::Arc;

use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::SnapajaError;

/// GET /api/download/:group_id/:filename - Download one file.
///
/// When duplicate filenames exist within the group, the first match by
/// insertion order is served.
#[utoipa::path(
    get,
    context_path = "/api",
    path = "/download/{group_id}/{filename}",
    tag = "download",
    params(
        ("group_id" = String, Path, description = "Group id"),
        ("filename" = String, Path, description = "Original filename, percent-encoded")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 404, description = "Group or file not found"),
        (status = 500, description = "Fetch failure")
    )
)]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path((group_id, filename)): Path<(String, String)>,
) -> Result<Response<Body>, ApiError> {
    tracing::info!("Download request for {} in group {}", filename, group_id);

    let download = state
        .downloads
        .single(&group_id, &filename)
        .await
        .map_err(|e| match e {
            SnapajaError::NotFound(resource) => {
                ApiError::not_found(format!("{resource} not found"))
            }
            e => {
                tracing::error!("Download failed for {}/{}: {}", group_id, filename, e);
                ApiError::internal("Download failed")
            }
        })?;

    let response = Response::builder()
        .header(header::CONTENT_TYPE, download.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                urlencoding::encode(&download.filename)
            ),
        )
        .header(header::CONTENT_LENGTH, download.content.len())
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from(download.content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })?;

    Ok(response)
}

/// GET /api/download-all/:group_id - Download every file in the group as an
/// uncompressed ZIP.
///
/// Files whose bytes cannot be fetched are skipped; the archive is still
/// returned without them.
#[utoipa::path(
    get,
    context_path = "/api",
    path = "/download-all/{group_id}",
    tag = "download",
    params(
        ("group_id" = String, Path, description = "Group id")
    ),
    responses(
        (status = 200, description = "ZIP archive", content_type = "application/zip"),
        (status = 404, description = "Group missing or empty"),
        (status = 500, description = "Archive failure")
    )
)]
pub async fn download_all(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
) -> Result<Response<Body>, ApiError> {
    tracing::info!("Download-all request for group {}", group_id);

    let group = state
        .repo
        .get_by_id(&group_id)
        .await
        .ok_or_else(|| ApiError::not_found("Group not found"))?;

    if group.files.is_empty() {
        return Err(ApiError::not_found("No files in group"));
    }

    let archive = state.downloads.zip_group(&group).await.map_err(|e| {
        tracing::error!("Failed to create archive for group {}: {}", group_id, e);
        ApiError::internal("Failed to create archive")
    })?;

    let response = Response::builder()
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", archive.filename),
        )
        .header(header::CONTENT_LENGTH, archive.content.len())
        .body(Body::from(archive.content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })?;

    Ok(response)
}
