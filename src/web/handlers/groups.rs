//! Group handlers: listing, browser-direct creation and deletion.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::group::FileRecord;
use crate::web::dto::{
    CreateGroupRequest, DeleteResponse, GroupResponse, GroupSummary, GroupsResponse,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// GET /api/groups - List all groups.
#[utoipa::path(
    get,
    context_path = "/api",
    path = "/groups",
    tag = "groups",
    responses(
        (status = 200, description = "All groups in creation order", body = GroupsResponse),
        (status = 500, description = "Store failure")
    )
)]
pub async fn list_groups(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GroupsResponse>, ApiError> {
    let groups = state.repo.get_all().await;

    let summaries: Vec<GroupSummary> = groups.iter().map(GroupSummary::from).collect();

    Ok(Json(GroupsResponse { groups: summaries }))
}

/// POST /api/groups/create - Create a group after a browser-direct upload.
///
/// The files are already in the blob store; the body carries their
/// descriptors and the optional group name.
#[utoipa::path(
    post,
    context_path = "/api",
    path = "/groups/create",
    tag = "groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 200, description = "Group created", body = GroupResponse),
        (status = 400, description = "No files provided"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn create_group(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<Json<GroupResponse>, ApiError> {
    if req.files.is_empty() {
        return Err(ApiError::bad_request("No files provided"));
    }

    let files: Vec<FileRecord> = req
        .files
        .into_iter()
        .map(|f| FileRecord {
            name: f.name,
            size: f.size,
            url: f.url,
            pathname: f.pathname,
        })
        .collect();

    let group = state
        .uploads
        .finalize_direct(req.group_name, files)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create group: {}", e);
            ApiError::internal("Failed to create group").with_message(e.to_string())
        })?;

    Ok(Json(GroupResponse::new(group)))
}

/// DELETE /api/groups/:group_id - Delete a group and all its blobs.
#[utoipa::path(
    delete,
    context_path = "/api",
    path = "/groups/{group_id}",
    tag = "groups",
    params(
        ("group_id" = String, Path, description = "Group id")
    ),
    responses(
        (status = 200, description = "Group deleted", body = DeleteResponse),
        (status = 404, description = "Unknown group"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn delete_group(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    tracing::info!("Request to delete group: {}", group_id);

    let group = state
        .repo
        .get_by_id(&group_id)
        .await
        .ok_or_else(|| ApiError::not_found("Kelompok tidak ditemukan"))?;

    // Delete blobs first, by key prefix. Best-effort: a blob failure does
    // not keep the metadata record alive.
    let blob = state.blob.clone();
    let prefix = format!("{group_id}/");
    let removed = tokio::task::spawn_blocking(move || blob.delete_prefix(&prefix)).await;

    match removed {
        Ok(Ok(count)) => tracing::info!("Deleted {} blob(s) for group {}", count, group_id),
        Ok(Err(e)) => tracing::warn!("Failed to delete blobs for group {}: {}", group_id, e),
        Err(e) => tracing::warn!("Blob deletion task failed for group {}: {}", group_id, e),
    }

    state.repo.delete(&group_id).await.map_err(|e| {
        tracing::error!("Failed to delete group {}: {}", group_id, e);
        ApiError::internal("Gagal menghapus kelompok")
    })?;

    tracing::info!("Group deleted successfully: {}", group.name);

    Ok(Json(DeleteResponse {
        success: true,
        message: "Kelompok berhasil dihapus".to_string(),
    }))
}
