//! Group repository.
//!
//! Higher-level group operations on top of the metadata store adapter.
//! Every write is load-whole-collection, compute, save-whole-collection.
//! The read-modify-write is NOT transactional: two concurrent writers can
//! read the same snapshot and the second save overwrites the first (a lost
//! update). A hardened version would add a compare-and-swap on a version
//! stamp while keeping this contract identical for callers.

use tracing::debug;

use crate::group::{total_size, FileRecord, Group};
use crate::store::MetadataStore;
use crate::{Result, SnapajaError};

/// Repository for group metadata. The single source of truth for group
/// existence and composition.
#[derive(Debug, Clone)]
pub struct GroupRepository {
    store: MetadataStore,
}

impl GroupRepository {
    /// Create a new repository on the given metadata store.
    pub fn new(store: MetadataStore) -> Self {
        Self { store }
    }

    /// Get all groups.
    pub async fn get_all(&self) -> Vec<Group> {
        self.store.load_all().await
    }

    /// Get a group by id. Linear scan by id equality.
    pub async fn get_by_id(&self, id: &str) -> Option<Group> {
        self.store.load_all().await.into_iter().find(|g| g.id == id)
    }

    /// Append a fully-formed group to the collection.
    pub async fn create(&self, group: Group) -> Result<Group> {
        let mut groups = self.store.load_all().await;
        groups.push(group.clone());
        self.store.save_all(&groups).await?;

        debug!("Created group {}", group.id);
        Ok(group)
    }

    /// Append files to an existing group, preserving insertion order, and
    /// recompute its total size as the full re-sum.
    pub async fn append_files(&self, id: &str, new_files: Vec<FileRecord>) -> Result<Group> {
        let mut groups = self.store.load_all().await;

        let group = groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| SnapajaError::NotFound("Group".to_string()))?;

        group.files.extend(new_files);
        group.total_size = total_size(&group.files);
        let updated = group.clone();

        self.store.save_all(&groups).await?;

        debug!("Appended files to group {}", id);
        Ok(updated)
    }

    /// Remove the group with the given id.
    ///
    /// A no-op when no such group exists: the repository does not
    /// distinguish "deleted" from "was already absent". The HTTP layer
    /// checks existence first to produce its 404.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let mut groups = self.store.load_all().await;
        groups.retain(|g| g.id != id);
        self.store.save_all(&groups).await?;

        debug!("Deleted group {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn setup() -> (Database, GroupRepository) {
        let db = Database::open_in_memory().await.unwrap();
        let repo = GroupRepository::new(MetadataStore::new(db.pool()));
        (db, repo)
    }

    fn record(name: &str, size: u64) -> FileRecord {
        FileRecord {
            name: name.to_string(),
            size,
            url: format!("http://localhost/blob/g/{name}"),
            pathname: format!("g/{name}"),
        }
    }

    fn sample_group(name: &str, files: Vec<FileRecord>) -> Group {
        Group::new(Group::generate_id(), Some(name.to_string()), files)
    }

    #[tokio::test]
    async fn test_create_and_get_by_id() {
        let (_db, repo) = setup().await;

        let group = sample_group("tugas", vec![record("a.txt", 10)]);
        let created = repo.create(group.clone()).await.unwrap();
        assert_eq!(created, group);

        let fetched = repo.get_by_id(&group.id).await.unwrap();
        assert_eq!(fetched, group);

        assert!(repo.get_by_id("no-such-id").await.is_none());
    }

    #[tokio::test]
    async fn test_get_all_preserves_creation_order() {
        let (_db, repo) = setup().await;

        let first = repo.create(sample_group("first", vec![])).await.unwrap();
        let second = repo.create(sample_group("second", vec![])).await.unwrap();

        let all = repo.get_all().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, first.id);
        assert_eq!(all[1].id, second.id);
    }

    #[tokio::test]
    async fn test_append_preserves_order_and_totals() {
        let (_db, repo) = setup().await;

        let group = repo
            .create(sample_group(
                "g",
                vec![record("a.txt", 10), record("b.txt", 20)],
            ))
            .await
            .unwrap();

        let updated = repo
            .append_files(&group.id, vec![record("c.txt", 5)])
            .await
            .unwrap();

        let names: Vec<&str> = updated.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a.txt", "b.txt", "c.txt"]);
        assert_eq!(updated.total_size, 35);

        // Persisted state matches the returned group
        let fetched = repo.get_by_id(&group.id).await.unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn test_total_size_invariant_after_every_write() {
        let (_db, repo) = setup().await;

        let group = repo
            .create(sample_group("g", vec![record("a.bin", 7)]))
            .await
            .unwrap();
        repo.append_files(&group.id, vec![record("b.bin", 11), record("c.bin", 13)])
            .await
            .unwrap();

        for g in repo.get_all().await {
            assert_eq!(g.total_size, total_size(&g.files));
        }
    }

    #[tokio::test]
    async fn test_append_to_missing_group() {
        let (_db, repo) = setup().await;

        let result = repo.append_files("missing", vec![record("a.txt", 1)]).await;
        assert!(matches!(result, Err(SnapajaError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_db, repo) = setup().await;

        let group = repo.create(sample_group("g", vec![])).await.unwrap();
        let other = repo.create(sample_group("other", vec![])).await.unwrap();

        repo.delete(&group.id).await.unwrap();
        assert!(repo.get_by_id(&group.id).await.is_none());
        assert!(repo.get_by_id(&other.id).await.is_some());

        // Deleting a non-existent id also succeeds
        repo.delete(&group.id).await.unwrap();
        repo.delete("never-existed").await.unwrap();
        assert_eq!(repo.get_all().await.len(), 1);
    }
}
