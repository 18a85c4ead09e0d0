//! Upload handlers: server-relayed multipart uploads and direct-upload
//! token issuance.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use std::sync::Arc;

use crate::service::FilePayload;
use crate::store::valid_pathname;
use crate::web::dto::{GroupResponse, UploadTokenRequest, UploadTokenResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::SnapajaError;

/// Decoded multipart form: optional group name plus file payloads.
struct UploadForm {
    group_name: Option<String>,
    payloads: Vec<FilePayload>,
}

/// Decode a multipart request, enforcing the configured limits.
///
/// File parts are read under the field name `files`; `groupName` is the
/// only recognized text field. Buffers are dropped on every exit path.
async fn decode_upload_form(
    multipart: &mut Multipart,
    state: &AppState,
) -> Result<UploadForm, ApiError> {
    let limits = &state.upload_config;
    let mut group_name: Option<String> = None;
    let mut payloads: Vec<FilePayload> = Vec::new();
    let mut field_count = 0usize;

    while let Some(mut field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "files" => {
                if payloads.len() >= limits.max_files {
                    return Err(ApiError::bad_request(format!(
                        "Too many files (max {})",
                        limits.max_files
                    )));
                }

                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or_else(|| ApiError::bad_request("File field without filename"))?;

                // Read the part incrementally and abort as soon as the
                // running count passes the ceiling, so an oversized part
                // never gets fully buffered.
                let mut content: Vec<u8> = Vec::new();
                loop {
                    let chunk = field.chunk().await.map_err(|e| {
                        tracing::error!("Failed to read file content: {}", e);
                        ApiError::bad_request("Failed to read file")
                    })?;
                    let Some(chunk) = chunk else { break };

                    if content.len() as u64 + chunk.len() as u64 > limits.max_file_size_bytes {
                        let max_mb = limits.max_file_size_bytes / 1024 / 1024;
                        return Err(ApiError::bad_request(format!(
                            "File too large (max {max_mb}MB)"
                        )));
                    }
                    content.extend_from_slice(&chunk);
                }

                payloads.push(FilePayload {
                    name: filename,
                    content,
                });
            }
            other => {
                field_count += 1;
                if field_count > limits.max_fields {
                    return Err(ApiError::bad_request(format!(
                        "Too many fields (max {})",
                        limits.max_fields
                    )));
                }

                if other == "groupName" {
                    group_name = Some(field.text().await.map_err(|e| {
                        tracing::error!("Failed to read groupName: {}", e);
                        ApiError::bad_request("Invalid groupName")
                    })?);
                }
            }
        }
    }

    Ok(UploadForm {
        group_name,
        payloads,
    })
}

/// POST /api/upload - Server-relayed upload creating a new group.
///
/// Request body: multipart/form-data with one or more `files` parts and an
/// optional `groupName` field.
#[utoipa::path(
    post,
    context_path = "/api",
    path = "/upload",
    tag = "upload",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Group created", body = GroupResponse),
        (status = 400, description = "No files uploaded or limits exceeded"),
        (status = 500, description = "Upload failed")
    )
)]
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<GroupResponse>, ApiError> {
    let form = decode_upload_form(&mut multipart, &state).await?;

    if form.payloads.is_empty() {
        return Err(ApiError::bad_request("No files uploaded"));
    }

    let group = state
        .uploads
        .create_group(form.group_name, form.payloads)
        .await
        .map_err(|e| {
            tracing::error!("Upload failed: {}", e);
            ApiError::internal("Upload failed").with_message(e.to_string())
        })?;

    Ok(Json(GroupResponse::new(group)))
}

/// POST /api/upload/:group_id - Server-relayed upload appending files to an
/// existing group.
#[utoipa::path(
    post,
    context_path = "/api",
    path = "/upload/{group_id}",
    tag = "upload",
    params(
        ("group_id" = String, Path, description = "Group id")
    ),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Files appended", body = GroupResponse),
        (status = 400, description = "No files uploaded"),
        (status = 404, description = "Unknown group"),
        (status = 500, description = "Upload failed")
    )
)]
pub async fn upload_to_group(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<GroupResponse>, ApiError> {
    if state.repo.get_by_id(&group_id).await.is_none() {
        return Err(ApiError::not_found("Kelompok tidak ditemukan"));
    }

    let form = decode_upload_form(&mut multipart, &state).await?;

    if form.payloads.is_empty() {
        return Err(ApiError::bad_request("Tidak ada file yang diunggah"));
    }

    let group = state
        .uploads
        .append_to_group(&group_id, form.payloads)
        .await
        .map_err(|e| match e {
            // The group can disappear between the check above and the append
            SnapajaError::NotFound(_) => ApiError::not_found("Kelompok tidak ditemukan"),
            e => {
                tracing::error!("Failed to append files to group {}: {}", group_id, e);
                ApiError::internal("Gagal menambahkan file").with_message(e.to_string())
            }
        })?;

    Ok(Json(GroupResponse::new(group)))
}

/// POST /api/upload/token - Issue a direct-upload authorization for a
/// browser-to-store transfer.
#[utoipa::path(
    post,
    context_path = "/api",
    path = "/upload/token",
    tag = "upload",
    request_body = UploadTokenRequest,
    responses(
        (status = 200, description = "Signed token plus constraints", body = UploadTokenResponse),
        (status = 400, description = "Invalid pathname or issuance error")
    )
)]
pub async fn issue_upload_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UploadTokenRequest>,
) -> Result<Json<UploadTokenResponse>, ApiError> {
    if !valid_pathname(&req.pathname) {
        return Err(ApiError::bad_request("Invalid pathname"));
    }

    tracing::info!("Generating upload token for: {}", req.pathname);

    let issued = state.tokens.issue(&req.pathname)?;

    Ok(Json(UploadTokenResponse {
        token: issued.token,
        pathname: issued.pathname,
        maximum_size_in_bytes: issued.maximum_size_in_bytes,
        valid_until: issued.valid_until,
    }))
}
