//! Response DTOs for the Web API.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::group::Group;

/// Per-file summary in group listings: name and size only.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileSummary {
    /// Original filename.
    pub name: String,
    /// Byte length.
    pub size: u64,
}

/// Public summary of one group, without blob URLs or pathnames.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    /// Group id.
    pub id: String,
    /// Group name.
    pub name: String,
    /// Creation timestamp.
    pub uploaded_at: DateTime<Utc>,
    /// Number of files in the group.
    pub file_count: usize,
    /// Sum of all file sizes.
    pub total_size: u64,
    /// Per-file name and size.
    pub files: Vec<FileSummary>,
}

impl From<&Group> for GroupSummary {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id.clone(),
            name: group.name.clone(),
            uploaded_at: group.uploaded_at,
            file_count: group.files.len(),
            total_size: group.total_size,
            files: group
                .files
                .iter()
                .map(|f| FileSummary {
                    name: f.name.clone(),
                    size: f.size,
                })
                .collect(),
        }
    }
}

/// Response of `GET /api/groups`.
#[derive(Debug, Serialize, ToSchema)]
pub struct GroupsResponse {
    /// All groups, in creation order.
    pub groups: Vec<GroupSummary>,
}

/// Response of the upload and group-creation endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct GroupResponse {
    /// Always true on success.
    pub success: bool,
    /// The created or updated group.
    pub group: Group,
}

impl GroupResponse {
    /// Wrap a group in a success response.
    pub fn new(group: Group) -> Self {
        Self {
            success: true,
            group,
        }
    }
}

/// Response of `DELETE /api/groups/{groupId}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    /// Always true on success.
    pub success: bool,
    /// Confirmation message.
    pub message: String,
}

/// Response of `POST /api/upload/token`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadTokenResponse {
    /// Signed direct-upload token.
    pub token: String,
    /// Pathname the token is scoped to.
    pub pathname: String,
    /// Maximum accepted upload size in bytes.
    pub maximum_size_in_bytes: u64,
    /// Expiry timestamp.
    pub valid_until: DateTime<Utc>,
}

/// Response of the direct-upload blob PUT.
#[derive(Debug, Serialize, ToSchema)]
pub struct DirectUploadResponse {
    /// Public blob URL.
    pub url: String,
    /// Blob key.
    pub pathname: String,
    /// Stored byte length.
    pub size: u64,
}
