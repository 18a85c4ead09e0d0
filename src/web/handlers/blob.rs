//! Blob routes: the public face of the blob store.
//!
//! Stored blobs are reachable at `GET /blob/{pathname}` (the URL recorded
//! on every file record), and browser-direct uploads PUT their bytes here
//! with a token issued by `POST /api/upload/token`.

use axum::{
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::header,
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::web::dto::{DirectUploadQuery, DirectUploadResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::SnapajaError;

/// GET /blob/*pathname - Serve a stored blob.
#[utoipa::path(
    get,
    path = "/blob/{pathname}",
    tag = "blob",
    params(
        ("pathname" = String, Path, description = "Blob key, {groupId}/{filename}")
    ),
    responses(
        (status = 200, description = "Blob bytes", content_type = "application/octet-stream"),
        (status = 404, description = "Unknown blob")
    )
)]
pub async fn serve_blob(
    State(state): State<Arc<AppState>>,
    Path(pathname): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let blob = state.blob.clone();
    let key = pathname.clone();
    let content = tokio::task::spawn_blocking(move || blob.read(&key))
        .await
        .map_err(|e| {
            tracing::error!("Blob read task failed: {}", e);
            ApiError::internal("Failed to load blob")
        })?
        .map_err(|e| match e {
            SnapajaError::NotFound(_) => ApiError::not_found("Blob not found"),
            e => {
                tracing::error!("Failed to load blob {}: {}", pathname, e);
                ApiError::internal("Failed to load blob")
            }
        })?;

    let content_type = mime_guess::from_path(&pathname)
        .first_or_octet_stream()
        .to_string();

    let response = Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, content.len())
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })?;

    Ok(response)
}

/// PUT /blob/*pathname - Browser-direct upload of one blob.
///
/// Authorized by a token from POST /api/upload/token scoped to the same
/// pathname. The stored size is reported back and is authoritative.
#[utoipa::path(
    put,
    path = "/blob/{pathname}",
    tag = "blob",
    params(
        ("pathname" = String, Path, description = "Blob key, {groupId}/{filename}"),
        ("token" = String, Query, description = "Direct-upload token")
    ),
    request_body(content = String, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Blob stored", body = DirectUploadResponse),
        (status = 400, description = "Size over the token's limit"),
        (status = 401, description = "Invalid or expired token"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn direct_upload(
    State(state): State<Arc<AppState>>,
    Path(pathname): Path<String>,
    Query(query): Query<DirectUploadQuery>,
    body: Bytes,
) -> Result<Json<DirectUploadResponse>, ApiError> {
    let claims = state.tokens.verify(&query.token, &pathname)?;

    if body.len() as u64 > claims.max_size {
        let max_mb = claims.max_size / 1024 / 1024;
        return Err(ApiError::bad_request(format!(
            "File too large (max {max_mb}MB)"
        )));
    }

    let blob = state.blob.clone();
    let key = pathname.clone();
    let result = tokio::task::spawn_blocking(move || blob.put(&key, &body))
        .await
        .map_err(|e| {
            tracing::error!("Blob write task failed: {}", e);
            ApiError::internal("Failed to store blob")
        })?
        .map_err(|e| {
            tracing::error!("Failed to store blob {}: {}", pathname, e);
            ApiError::from(e)
        })?;

    tracing::info!("Client upload completed: {}", result.pathname);

    Ok(Json(DirectUploadResponse {
        url: result.url,
        pathname: result.pathname,
        size: result.size,
    }))
}
