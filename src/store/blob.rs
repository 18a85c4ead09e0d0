//! Blob storage for Snapaja.
//!
//! File bytes live on the local filesystem under keys of the form
//! `{groupId}/{originalFilename}`. Each stored blob is reachable at a
//! public URL served by the web layer, and whole groups are removed by
//! key prefix.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::{Result, SnapajaError};

/// Result of storing one blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutResult {
    /// Publicly resolvable URL of the stored blob.
    pub url: String,
    /// Blob key, `{groupId}/{filename}`.
    pub pathname: String,
    /// Stored byte length. Authoritative over any client-declared size.
    pub size: u64,
}

/// Filesystem-backed blob store.
#[derive(Debug, Clone)]
pub struct BlobStorage {
    /// Base directory for blob storage.
    base_path: PathBuf,
    /// Base URL under which blobs are served, without trailing slash.
    public_base_url: String,
}

impl BlobStorage {
    /// Create a new BlobStorage with the given base path and public URL.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            base_path,
            public_base_url,
        })
    }

    /// Get the base path of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Store content under the given pathname, overwriting any existing blob.
    pub fn put(&self, pathname: &str, content: &[u8]) -> Result<PutResult> {
        let file_path = self.resolve(pathname)?;

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&file_path, content)?;

        Ok(PutResult {
            url: self.url_for(pathname),
            pathname: pathname.to_string(),
            size: content.len() as u64,
        })
    }

    /// Load the content of a stored blob.
    pub fn read(&self, pathname: &str) -> Result<Vec<u8>> {
        let file_path = self.resolve(pathname)?;

        match fs::read(&file_path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(SnapajaError::NotFound(format!("Blob {pathname}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check if a blob exists.
    pub fn exists(&self, pathname: &str) -> bool {
        self.resolve(pathname)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    /// List the pathnames of all blobs whose key starts with `prefix`.
    pub fn list_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut pathnames = Vec::new();
        collect_pathnames(&self.base_path, String::new(), &mut pathnames)?;
        pathnames.retain(|p| p.starts_with(prefix));
        pathnames.sort();
        Ok(pathnames)
    }

    /// Delete every blob whose key starts with `prefix`.
    ///
    /// Returns the number of blobs removed. Emptied directories are cleaned
    /// up best-effort.
    pub fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let mut removed = 0;

        for pathname in self.list_prefix(prefix)? {
            let file_path = self.resolve(&pathname)?;
            match fs::remove_file(&file_path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }

            if let Some(parent) = file_path.parent() {
                // Remove the group directory once it is empty; ignore failure
                let _ = fs::remove_dir(parent);
            }
        }

        Ok(removed)
    }

    /// Public URL for a blob key.
    pub fn url_for(&self, pathname: &str) -> String {
        let encoded: Vec<String> = pathname
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/blob/{}", self.public_base_url, encoded.join("/"))
    }

    /// Resolve a blob key to a filesystem path, rejecting traversal attempts.
    fn resolve(&self, pathname: &str) -> Result<PathBuf> {
        if !valid_pathname(pathname) {
            return Err(SnapajaError::Validation(format!(
                "invalid blob pathname: {pathname}"
            )));
        }

        Ok(self.base_path.join(Path::new(pathname)))
    }
}

/// A blob key is a non-empty relative path with only normal components.
pub fn valid_pathname(pathname: &str) -> bool {
    !pathname.is_empty()
        && !pathname.contains('\0')
        && Path::new(pathname)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

/// Walk the storage tree collecting blob keys relative to `dir`.
fn collect_pathnames(dir: &Path, key_prefix: String, out: &mut Vec<String>) -> Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let key = if key_prefix.is_empty() {
            name
        } else {
            format!("{key_prefix}/{name}")
        };

        let path = entry.path();
        if path.is_dir() {
            collect_pathnames(&path, key, out)?;
        } else {
            out.push(key);
        }
    }

    Ok(())
}
