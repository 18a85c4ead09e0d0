//! Orchestration services: upload (server-relayed and browser-direct
//! finalize) and download (single file and bulk ZIP).

mod download;
mod upload;

pub use download::{DownloadService, FileDownload, ZipArchive};
pub use upload::{FilePayload, UploadService};
