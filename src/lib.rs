//! Snapaja - simple file-group sharing
//!
//! A small web service for uploading groups of files, browsing them, and
//! downloading them individually or as a ZIP archive.

pub mod config;
pub mod db;
pub mod error;
pub mod group;
pub mod logging;
pub mod service;
pub mod store;
pub mod web;

pub use config::Config;
pub use db::Database;
pub use error::{Result, SnapajaError};
pub use group::{FileRecord, Group, DEFAULT_GROUP_NAME};
pub use service::{DownloadService, FilePayload, UploadService};
pub use store::{BlobStorage, GroupRepository, MetadataStore};
pub use web::WebServer;
