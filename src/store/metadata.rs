//! Metadata store adapter.
//!
//! The entire collection of groups is stored as one JSON value under a
//! single well-known key. There is no partial or ranged access: every
//! caller reads the whole collection and writes the whole collection back.
//! This trades scale for simplicity and only holds while the catalog is
//! small; a larger deployment should move to per-group keys.

use sqlx::SqlitePool;
use tracing::warn;

use crate::group::Group;
use crate::Result;

/// Well-known key under which the group collection is stored.
pub const GROUPS_KEY: &str = "snapaja:groups";

/// Typed access to the group collection in the key-value store.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    pool: SqlitePool,
}

impl MetadataStore {
    /// Create a new metadata store on the given pool.
    pub fn new(pool: &SqlitePool) -> Self {
        Self { pool: pool.clone() }
    }

    /// Load the whole group collection.
    ///
    /// Read and parse failures are logged and degrade to an empty
    /// collection, they are not surfaced to callers. Availability over
    /// consistency.
    pub async fn load_all(&self) -> Vec<Group> {
        let row: std::result::Result<Option<(String,)>, sqlx::Error> =
            sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
                .bind(GROUPS_KEY)
                .fetch_optional(&self.pool)
                .await;

        match row {
            Ok(Some((value,))) => match serde_json::from_str(&value) {
                Ok(groups) => groups,
                Err(e) => {
                    warn!("Failed to parse stored groups, treating as empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read groups from store, treating as empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Save the whole group collection, replacing whatever was stored.
    pub async fn save_all(&self, groups: &[Group]) -> Result<()> {
        let value = serde_json::to_string(groups)?;

        sqlx::query(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, datetime('now')) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(GROUPS_KEY)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
