//! Request DTOs for the Web API.

use serde::Deserialize;
use utoipa::ToSchema;

/// Descriptor of one file already uploaded directly to the blob store.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DirectFileDescriptor {
    /// Original filename.
    pub name: String,
    /// Byte length reported by the blob store.
    pub size: u64,
    /// Public blob URL.
    pub url: String,
    /// Blob key.
    pub pathname: String,
}

/// Body of `POST /api/groups/create`: finalize a browser-direct upload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    /// Optional group name; a placeholder is used when omitted.
    #[serde(default)]
    pub group_name: Option<String>,
    /// Files already stored in the blob store.
    #[serde(default)]
    pub files: Vec<DirectFileDescriptor>,
}

/// Body of `POST /api/upload/token`: request a direct-upload token.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UploadTokenRequest {
    /// Blob pathname the browser intends to upload.
    pub pathname: String,
}

/// Query parameters of the direct-upload blob PUT.
#[derive(Debug, Deserialize)]
pub struct DirectUploadQuery {
    /// Signed direct-upload token.
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_group_request_camel_case() {
        let json = r#"{
            "groupName": "Tugas",
            "files": [{"name":"a.txt","size":3,"url":"http://x/blob/g/a.txt","pathname":"g/a.txt"}]
        }"#;
        let req: CreateGroupRequest = serde_json::from_str(json).unwrap();

        assert_eq!(req.group_name.as_deref(), Some("Tugas"));
        assert_eq!(req.files.len(), 1);
        assert_eq!(req.files[0].pathname, "g/a.txt");
    }

    #[test]
    fn test_create_group_request_defaults() {
        let req: CreateGroupRequest = serde_json::from_str("{}").unwrap();
        assert!(req.group_name.is_none());
        assert!(req.files.is_empty());
    }
}
