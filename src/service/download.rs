//! Download orchestration.
//!
//! Resolves group/file references to blob bytes, either as a single file
//! download or as a store-only ZIP of a whole group.

use std::io::Write;

use tokio::task;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::group::Group;
use crate::store::{BlobStorage, GroupRepository};
use crate::{Result, SnapajaError};

/// A resolved single-file download.
#[derive(Debug, Clone)]
pub struct FileDownload {
    /// Original filename.
    pub filename: String,
    /// Content type derived from the filename.
    pub content_type: String,
    /// File bytes.
    pub content: Vec<u8>,
}

/// An assembled ZIP archive of a group.
#[derive(Debug, Clone)]
pub struct ZipArchive {
    /// Archive filename, `{sanitizedGroupName}.zip`.
    pub filename: String,
    /// Archive bytes.
    pub content: Vec<u8>,
}

/// Resolves downloads against the repository and blob store.
#[derive(Debug, Clone)]
pub struct DownloadService {
    repo: GroupRepository,
    blob: BlobStorage,
}

impl DownloadService {
    /// Create a new download service.
    pub fn new(repo: GroupRepository, blob: BlobStorage) -> Self {
        Self { repo, blob }
    }

    /// Resolve a single file within a group and fetch its bytes.
    ///
    /// When duplicate names exist, the first match by insertion order wins.
    pub async fn single(&self, group_id: &str, filename: &str) -> Result<FileDownload> {
        let group = self
            .repo
            .get_by_id(group_id)
            .await
            .ok_or_else(|| SnapajaError::NotFound("Group".to_string()))?;

        let file = group
            .find_file(filename)
            .ok_or_else(|| SnapajaError::NotFound("File".to_string()))?;

        let blob = self.blob.clone();
        let pathname = file.pathname.clone();
        let content = task::spawn_blocking(move || blob.read(&pathname))
            .await
            .map_err(|e| SnapajaError::Blob(format!("fetch task failed: {e}")))??;

        let content_type = mime_guess::from_path(filename)
            .first_or_octet_stream()
            .to_string();

        Ok(FileDownload {
            filename: filename.to_string(),
            content_type,
            content,
        })
    }

    /// Assemble a store-only (uncompressed) ZIP of every file in the group.
    ///
    /// Best-effort: a file whose bytes cannot be fetched is logged and
    /// skipped, and the archive is still finalized without it. The caller
    /// is expected to have rejected empty groups already.
    pub async fn zip_group(&self, group: &Group) -> Result<ZipArchive> {
        let files = group.files.clone();
        let blob = self.blob.clone();
        let filename = format!("{}.zip", sanitize_archive_name(&group.name));

        let content = task::spawn_blocking(move || -> Result<Vec<u8>> {
            let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
            let options = FileOptions::default().compression_method(CompressionMethod::Stored);

            for file in &files {
                let bytes = match blob.read(&file.pathname) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        // Skip and continue with the remaining files
                        tracing::error!("Failed to fetch {} for archive: {}", file.name, e);
                        continue;
                    }
                };

                writer
                    .start_file(&file.name, options)
                    .map_err(|e| SnapajaError::Blob(format!("archive write failed: {e}")))?;
                writer.write_all(&bytes)?;
            }

            let cursor = writer
                .finish()
                .map_err(|e| SnapajaError::Blob(format!("archive finalize failed: {e}")))?;
            Ok(cursor.into_inner())
        })
        .await
        .map_err(|e| SnapajaError::Blob(format!("archive task failed: {e}")))??;

        Ok(ZipArchive { filename, content })
    }
}

/// Replace every character outside `[A-Za-z0-9]` with `_`.
fn sanitize_archive_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::service::{FilePayload, UploadService};
    use crate::store::MetadataStore;
    use std::io::Read;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, UploadService, DownloadService) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open_in_memory().await.unwrap();
        let repo = GroupRepository::new(MetadataStore::new(db.pool()));
        let blob = BlobStorage::new(temp_dir.path(), "http://localhost:3000").unwrap();
        let uploads = UploadService::new(repo.clone(), blob.clone());
        let downloads = DownloadService::new(repo, blob);
        (temp_dir, uploads, downloads)
    }

    fn payload(name: &str, content: &[u8]) -> FilePayload {
        FilePayload {
            name: name.to_string(),
            content: content.to_vec(),
        }
    }

    fn read_zip(content: &[u8]) -> Vec<(String, Vec<u8>)> {
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(content)).unwrap();
        let mut entries = Vec::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).unwrap();
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes).unwrap();
            entries.push((entry.name().to_string(), bytes));
        }
        entries
    }

    #[tokio::test]
    async fn test_single_download() {
        let (_tmp, uploads, downloads) = setup().await;

        let group = uploads
            .create_group(None, vec![payload("report.pdf", b"%PDF-data")])
            .await
            .unwrap();

        let download = downloads.single(&group.id, "report.pdf").await.unwrap();

        assert_eq!(download.filename, "report.pdf");
        assert_eq!(download.content_type, "application/pdf");
        assert_eq!(download.content, b"%PDF-data");
    }

    #[tokio::test]
    async fn test_single_download_unknown_group() {
        let (_tmp, _uploads, downloads) = setup().await;

        let result = downloads.single("missing", "a.txt").await;
        assert!(matches!(result, Err(SnapajaError::NotFound(r)) if r == "Group"));
    }

    #[tokio::test]
    async fn test_single_download_unknown_file() {
        let (_tmp, uploads, downloads) = setup().await;

        let group = uploads
            .create_group(None, vec![payload("a.txt", b"x")])
            .await
            .unwrap();

        let result = downloads.single(&group.id, "b.txt").await;
        assert!(matches!(result, Err(SnapajaError::NotFound(r)) if r == "File"));
    }

    #[tokio::test]
    async fn test_zip_group_contains_all_files_uncompressed() {
        let (_tmp, uploads, downloads) = setup().await;

        let group = uploads
            .create_group(
                Some("Laporan Akhir 2024".to_string()),
                vec![payload("a.txt", b"alpha"), payload("b.txt", b"beta")],
            )
            .await
            .unwrap();

        let archive = downloads.zip_group(&group).await.unwrap();
        assert_eq!(archive.filename, "Laporan_Akhir_2024.zip");

        let entries = read_zip(&archive.content);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], ("a.txt".to_string(), b"alpha".to_vec()));
        assert_eq!(entries[1], ("b.txt".to_string(), b"beta".to_vec()));
    }

    #[tokio::test]
    async fn test_zip_group_skips_unfetchable_files() {
        let (tmp, uploads, downloads) = setup().await;

        let group = uploads
            .create_group(
                None,
                vec![payload("keep.txt", b"kept"), payload("gone.txt", b"lost")],
            )
            .await
            .unwrap();

        // Remove one blob behind the metadata's back
        std::fs::remove_file(tmp.path().join(&group.id).join("gone.txt")).unwrap();

        let archive = downloads.zip_group(&group).await.unwrap();
        let entries = read_zip(&archive.content);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "keep.txt");
    }

    #[test]
    fn test_sanitize_archive_name() {
        assert_eq!(sanitize_archive_name("Kelompok Tanpa Nama"), "Kelompok_Tanpa_Nama");
        assert_eq!(sanitize_archive_name("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_archive_name("abc123"), "abc123");
        assert_eq!(sanitize_archive_name("日本語"), "___");
    }
}
