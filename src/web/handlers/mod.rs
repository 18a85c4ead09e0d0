//! API handlers for the Snapaja Web API.

pub mod blob;
pub mod download;
pub mod groups;
pub mod upload;

pub use blob::*;
pub use download::*;
pub use groups::*;
pub use upload::*;

use crate::config::UploadConfig;
use crate::db::Database;
use crate::service::{DownloadService, UploadService};
use crate::store::{BlobStorage, GroupRepository, MetadataStore};
use crate::web::token::UploadTokenIssuer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Group metadata repository.
    pub repo: GroupRepository,
    /// Blob storage.
    pub blob: BlobStorage,
    /// Upload orchestration.
    pub uploads: UploadService,
    /// Download orchestration.
    pub downloads: DownloadService,
    /// Direct-upload token issuer.
    pub tokens: UploadTokenIssuer,
    /// Upload limits.
    pub upload_config: UploadConfig,
}

impl AppState {
    /// Create a new application state.
    pub fn new(db: &Database, blob: BlobStorage, upload_config: &UploadConfig) -> Self {
        let repo = GroupRepository::new(MetadataStore::new(db.pool()));

        Self {
            repo: repo.clone(),
            blob: blob.clone(),
            uploads: UploadService::new(repo.clone(), blob.clone()),
            downloads: DownloadService::new(repo, blob),
            tokens: UploadTokenIssuer::new(upload_config),
            upload_config: upload_config.clone(),
        }
    }
}
