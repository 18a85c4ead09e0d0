//! Upload orchestration.
//!
//! Two entry modes converge on the same repository call: server-relayed
//! uploads carry decoded multipart payloads through the blob store, while
//! browser-direct uploads arrive as pre-uploaded blob descriptors that only
//! need a group record. After either succeeds, the group's files exactly
//! mirror what was durably stored.

use futures::future;
use tokio::task;
use tracing::info;

use crate::group::{FileRecord, Group};
use crate::store::{BlobStorage, GroupRepository};
use crate::{Result, SnapajaError};

/// A decoded file payload from a multipart request.
#[derive(Debug, Clone)]
pub struct FilePayload {
    /// Original filename.
    pub name: String,
    /// File content. Dropped on every exit path once the request settles.
    pub content: Vec<u8>,
}

/// Coordinates file payloads into blob storage and group records.
#[derive(Debug, Clone)]
pub struct UploadService {
    repo: GroupRepository,
    blob: BlobStorage,
}

impl UploadService {
    /// Create a new upload service.
    pub fn new(repo: GroupRepository, blob: BlobStorage) -> Self {
        Self { repo, blob }
    }

    /// Server-relayed upload creating a new group.
    ///
    /// Every payload is stored under `{newId}/{filename}`; the group record
    /// is only created after all blob writes succeed.
    pub async fn create_group(
        &self,
        group_name: Option<String>,
        payloads: Vec<FilePayload>,
    ) -> Result<Group> {
        let group_id = Group::generate_id();
        info!(
            "Creating new group {} with {} file(s)",
            group_id,
            payloads.len()
        );

        let files = self.store_payloads(&group_id, payloads).await?;
        let group = Group::new(group_id, group_name, files);

        self.repo.create(group).await
    }

    /// Server-relayed upload appending to an existing group.
    ///
    /// NotFound if the group does not exist. No partial group mutation is
    /// attempted when any blob write fails; blobs already written are not
    /// rolled back.
    pub async fn append_to_group(
        &self,
        group_id: &str,
        payloads: Vec<FilePayload>,
    ) -> Result<Group> {
        if self.repo.get_by_id(group_id).await.is_none() {
            return Err(SnapajaError::NotFound("Group".to_string()));
        }

        info!(
            "Adding {} file(s) to group {}",
            payloads.len(),
            group_id
        );

        let files = self.store_payloads(group_id, payloads).await?;
        self.repo.append_files(group_id, files).await
    }

    /// Finalize a browser-direct upload: the files are already in the blob
    /// store, only the group record is created here.
    pub async fn finalize_direct(
        &self,
        group_name: Option<String>,
        files: Vec<FileRecord>,
    ) -> Result<Group> {
        let group = Group::new(Group::generate_id(), group_name, files);
        info!(
            "Finalizing client-side upload as group {} with {} file(s)",
            group.id,
            group.files.len()
        );

        self.repo.create(group).await
    }

    /// Store all payloads in the blob store concurrently and assemble file
    /// records from the store-reported results, in payload order.
    ///
    /// Waits for every write to settle, then fails on the first error.
    /// Blobs written for payloads that succeeded are left in place.
    async fn store_payloads(
        &self,
        group_id: &str,
        payloads: Vec<FilePayload>,
    ) -> Result<Vec<FileRecord>> {
        let uploads: Vec<_> = payloads
            .into_iter()
            .map(|payload| {
                let blob = self.blob.clone();
                let pathname = format!("{group_id}/{}", payload.name);
                task::spawn_blocking(move || {
                    blob.put(&pathname, &payload.content).map(|r| FileRecord {
                        name: payload.name,
                        size: r.size,
                        url: r.url,
                        pathname: r.pathname,
                    })
                })
            })
            .collect();

        let settled = future::join_all(uploads).await;

        let mut records = Vec::with_capacity(settled.len());
        for outcome in settled {
            let record =
                outcome.map_err(|e| SnapajaError::Blob(format!("upload task failed: {e}")))??;
            records.push(record);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::group::DEFAULT_GROUP_NAME;
    use crate::store::MetadataStore;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, Database, UploadService) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open_in_memory().await.unwrap();
        let repo = GroupRepository::new(MetadataStore::new(db.pool()));
        let blob = BlobStorage::new(temp_dir.path(), "http://localhost:3000").unwrap();
        let service = UploadService::new(repo, blob);
        (temp_dir, db, service)
    }

    fn payload(name: &str, content: &[u8]) -> FilePayload {
        FilePayload {
            name: name.to_string(),
            content: content.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_create_group_stores_blobs_and_metadata() {
        let (_tmp, db, service) = setup().await;

        let group = service
            .create_group(
                Some("Praktikum".to_string()),
                vec![payload("a.txt", b"abc"), payload("b.txt", b"defgh")],
            )
            .await
            .unwrap();

        assert_eq!(group.name, "Praktikum");
        assert_eq!(group.total_size, 8);
        assert_eq!(group.files[0].pathname, format!("{}/a.txt", group.id));
        assert_eq!(group.files[1].size, 5);

        // Metadata persisted
        let repo = GroupRepository::new(MetadataStore::new(db.pool()));
        let fetched = repo.get_by_id(&group.id).await.unwrap();
        assert_eq!(fetched, group);
    }

    #[tokio::test]
    async fn test_create_group_defaults_name() {
        let (_tmp, _db, service) = setup().await;

        let group = service
            .create_group(None, vec![payload("a.txt", b"abc")])
            .await
            .unwrap();

        assert_eq!(group.name, DEFAULT_GROUP_NAME);
        assert_eq!(group.total_size, 3);
    }

    #[tokio::test]
    async fn test_size_comes_from_the_store_not_the_client() {
        let (_tmp, _db, service) = setup().await;

        let group = service
            .create_group(None, vec![payload("data.bin", &[0u8; 1234])])
            .await
            .unwrap();

        assert_eq!(group.files[0].size, 1234);
    }

    #[tokio::test]
    async fn test_append_to_group() {
        let (_tmp, _db, service) = setup().await;

        let group = service
            .create_group(None, vec![payload("a.txt", b"0123456789")])
            .await
            .unwrap();

        let updated = service
            .append_to_group(&group.id, vec![payload("b.txt", b"01234")])
            .await
            .unwrap();

        let names: Vec<&str> = updated.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a.txt", "b.txt"]);
        assert_eq!(updated.total_size, 15);
    }

    #[tokio::test]
    async fn test_append_to_missing_group() {
        let (_tmp, _db, service) = setup().await;

        let result = service
            .append_to_group("missing", vec![payload("a.txt", b"x")])
            .await;
        assert!(matches!(result, Err(SnapajaError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_failed_upload_creates_no_group() {
        let (_tmp, db, service) = setup().await;

        // A traversal pathname makes the blob write fail for that file
        let result = service
            .create_group(
                None,
                vec![payload("ok.txt", b"fine"), payload("../evil.txt", b"bad")],
            )
            .await;

        assert!(result.is_err());

        let repo = GroupRepository::new(MetadataStore::new(db.pool()));
        assert!(repo.get_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_finalize_direct() {
        let (_tmp, _db, service) = setup().await;

        let files = vec![
            FileRecord {
                name: "a.txt".to_string(),
                size: 3,
                url: "http://localhost:3000/blob/x/a.txt".to_string(),
                pathname: "x/a.txt".to_string(),
            },
            FileRecord {
                name: "b.txt".to_string(),
                size: 4,
                url: "http://localhost:3000/blob/x/b.txt".to_string(),
                pathname: "x/b.txt".to_string(),
            },
        ];

        let group = service
            .finalize_direct(Some("Direct".to_string()), files.clone())
            .await
            .unwrap();

        assert_eq!(group.name, "Direct");
        assert_eq!(group.files, files);
        assert_eq!(group.total_size, 7);
    }
}
