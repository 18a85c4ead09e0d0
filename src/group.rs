//! Group and file metadata model.
//!
//! A group ("kelompok") is the unit of sharing: a named, timestamped,
//! ordered collection of uploaded files. The whole collection of groups
//! is stored as one value in the metadata store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Placeholder name used when the uploader does not supply one.
pub const DEFAULT_GROUP_NAME: &str = "Kelompok Tanpa Nama";

/// One uploaded file, always owned by exactly one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileRecord {
    /// Original filename as supplied by the uploader. Duplicates within a
    /// group are permitted.
    pub name: String,
    /// Byte length as reported by the blob store, not the client.
    pub size: u64,
    /// Publicly resolvable blob URL.
    pub url: String,
    /// Blob store key, `{groupId}/{filename}`. Used for deletion by prefix.
    pub pathname: String,
}

/// A named group of uploaded files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Opaque unique identifier, assigned at creation.
    pub id: String,
    /// Human-readable label; not required to be unique.
    pub name: String,
    /// Creation timestamp, set once.
    pub uploaded_at: DateTime<Utc>,
    /// Files in insertion order. Append-only in practice.
    pub files: Vec<FileRecord>,
    /// Denormalized sum of all file sizes, recomputed on every mutation.
    pub total_size: u64,
}

impl Group {
    /// Create a new group with the current timestamp.
    ///
    /// The id is supplied by the caller because blob keys carry it before
    /// the group record exists. `total_size` is computed from `files`; an
    /// omitted or empty name falls back to [`DEFAULT_GROUP_NAME`].
    pub fn new(id: impl Into<String>, name: Option<String>, files: Vec<FileRecord>) -> Self {
        let name = match name {
            Some(n) if !n.trim().is_empty() => n,
            _ => DEFAULT_GROUP_NAME.to_string(),
        };
        let total_size = total_size(&files);

        Self {
            id: id.into(),
            name,
            uploaded_at: Utc::now(),
            files,
            total_size,
        }
    }

    /// Generate a fresh group id.
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Find a file by exact name. First match in insertion order wins when
    /// duplicate names exist.
    pub fn find_file(&self, name: &str) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.name == name)
    }
}

/// Sum of file sizes, the authoritative value for `Group::total_size`.
///
/// Saturating: descriptor sizes arrive from clients on the direct-upload
/// path and must never overflow the sum.
pub fn total_size(files: &[FileRecord]) -> u64 {
    files
        .iter()
        .fold(0u64, |acc, f| acc.saturating_add(f.size))
}
