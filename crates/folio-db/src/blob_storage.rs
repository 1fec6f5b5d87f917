//! Blob storage for the document backend.
//!
//! Each document is one JSON blob. Blob names are derived from the document
//! path with [`blob_name`], so arbitrary paths (slashes, unicode, `..`) never
//! reach the filesystem as path components.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use folio_core::{defaults, Result};

/// Flat key/value storage of serialized documents.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Write (or replace) a blob.
    async fn write(&self, name: &str, data: &[u8]) -> Result<()>;

    /// Read a blob; `None` if it does not exist.
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a blob. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Names of every stored blob, in no particular order.
    async fn names(&self) -> Result<Vec<String>>;
}

/// Blob name for a document path: BLAKE3 hex digest plus the blob extension.
pub fn blob_name(path: &str) -> String {
    format!(
        "{}.{}",
        blake3::hash(path.as_bytes()).to_hex(),
        defaults::BLOB_EXTENSION
    )
}

/// One file per blob in a single directory.
pub struct FilesystemBlobs {
    base_path: PathBuf,
}

impl FilesystemBlobs {
    /// Create a filesystem store rooted at `base_path` (created on first write).
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }
}

#[async_trait]
impl BlobStorage for FilesystemBlobs {
    async fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(name);
        debug!(blob = %name, full_path = %full_path.display(), size = data.len(), "blob_storage: write");

        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            warn!(base_path = %self.base_path.display(), error = %e, "blob_storage: create_dir_all failed");
            e
        })?;

        // Atomic write: temp file + rename
        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "blob_storage: File::create failed");
            e
        })?;
        file.write_all(data).await.map_err(|e| {
            warn!(error = %e, "blob_storage: write_all failed");
            e
        })?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "blob_storage: rename failed");
            e
        })?;

        Ok(())
    }

    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.full_path(name)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        match fs::remove_file(self.full_path(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn names(&self) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            // Nothing written yet.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_blob = path
                .extension()
                .is_some_and(|ext| ext == defaults::BLOB_EXTENSION);
            if !is_blob {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

/// Map-backed blob storage for tests and ephemeral stores.
#[derive(Default)]
pub struct MemoryBlobs {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobs {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobs {
    async fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        self.blobs
            .write()
            .await
            .insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.read().await.get(name).cloned())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        Ok(self.blobs.write().await.remove(name).is_some())
    }

    async fn names(&self) -> Result<Vec<String>> {
        Ok(self.blobs.read().await.keys().cloned().collect())
    }
}
