//! Storage layer: blob storage for file bytes, key-value metadata store
//! and the group repository built on top of it.

mod blob;
mod metadata;
mod repository;

pub use blob::{valid_pathname, BlobStorage, PutResult};
pub use metadata::{MetadataStore, GROUPS_KEY};
pub use repository::GroupRepository;
