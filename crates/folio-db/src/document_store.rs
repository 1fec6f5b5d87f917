//! Document backend: one serialized blob per document, queried by full scan.

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use folio_core::{
    filter_documents, BackendKind, MetadataDocument, MetadataStore, Result, ValidatedFilter,
};

use crate::blob_storage::{blob_name, BlobStorage, FilesystemBlobs, MemoryBlobs};

/// Metadata store over any [`BlobStorage`].
///
/// Reads share the lock; every write holds it exclusively. Queries load the
/// whole document set and evaluate criteria in memory, so every operator
/// (including `regex`) is supported.
pub struct DocumentStore<B: BlobStorage> {
    blobs: RwLock<B>,
}

impl DocumentStore<FilesystemBlobs> {
    /// Store rooted at a directory.
    pub fn filesystem(base_path: impl Into<std::path::PathBuf>) -> Self {
        Self::new(FilesystemBlobs::new(base_path))
    }
}

impl DocumentStore<MemoryBlobs> {
    /// Ephemeral store.
    pub fn in_memory() -> Self {
        Self::new(MemoryBlobs::new())
    }
}

impl<B: BlobStorage> DocumentStore<B> {
    pub fn new(blobs: B) -> Self {
        Self {
            blobs: RwLock::new(blobs),
        }
    }

    fn encode(document: &MetadataDocument) -> Result<Vec<u8>> {
        document.validate()?;
        Ok(serde_json::to_vec(document)?)
    }

    fn decode(data: &[u8]) -> Result<MetadataDocument> {
        Ok(serde_json::from_slice(data)?)
    }

    async fn load_all(blobs: &B) -> Result<BTreeMap<String, MetadataDocument>> {
        let mut documents = BTreeMap::new();
        for name in blobs.names().await? {
            // A blob deleted between listing and reading is simply skipped.
            if let Some(data) = blobs.read(&name).await? {
                let document = Self::decode(&data)?;
                documents.insert(document.path.clone(), document);
            }
        }
        Ok(documents)
    }
}

#[async_trait]
impl<B: BlobStorage> MetadataStore for DocumentStore<B> {
    fn kind(&self) -> BackendKind {
        BackendKind::Document
    }

    async fn set(&self, document: MetadataDocument) -> Result<()> {
        let data = Self::encode(&document)?;
        let blobs = self.blobs.write().await;
        blobs.write(&blob_name(&document.path), &data).await?;
        debug!(
            subsystem = "database",
            component = "document_store",
            op = "set",
            path = %document.path,
            "Document stored"
        );
        Ok(())
    }

    async fn bulk_set(&self, documents: Vec<MetadataDocument>) -> Result<()> {
        let start = Instant::now();
        let count = documents.len();
        let blobs = self.blobs.write().await;
        // Writes are independent: a failure leaves earlier documents in place.
        for document in &documents {
            let data = Self::encode(document)?;
            blobs.write(&blob_name(&document.path), &data).await?;
        }
        info!(
            subsystem = "database",
            component = "document_store",
            op = "bulk_set",
            document_count = count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Bulk write complete"
        );
        Ok(())
    }

    async fn replace_all(&self, documents: Vec<MetadataDocument>) -> Result<usize> {
        let start = Instant::now();
        let count = documents.len();
        let blobs = self.blobs.write().await;

        let mut keep = HashSet::with_capacity(count);
        for document in &documents {
            let data = Self::encode(document)?;
            let name = blob_name(&document.path);
            blobs.write(&name, &data).await?;
            keep.insert(name);
        }

        // Blob names are path hashes, so stale documents are found without decoding.
        let mut removed = 0;
        for name in blobs.names().await? {
            if !keep.contains(&name) && blobs.delete(&name).await? {
                removed += 1;
            }
        }

        info!(
            subsystem = "database",
            component = "document_store",
            op = "replace_all",
            document_count = count,
            removed_count = removed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Document set replaced"
        );
        Ok(removed)
    }

    async fn delete(&self, path: &str) -> Result<bool> {
        let blobs = self.blobs.write().await;
        blobs.delete(&blob_name(path)).await
    }

    async fn get(&self, path: &str) -> Result<Option<MetadataDocument>> {
        let blobs = self.blobs.read().await;
        match blobs.read(&blob_name(path)).await? {
            Some(data) => Ok(Some(Self::decode(&data)?)),
            None => Ok(None),
        }
    }

    async fn get_all(&self) -> Result<BTreeMap<String, MetadataDocument>> {
        let blobs = self.blobs.read().await;
        Self::load_all(&blobs).await
    }

    async fn len(&self) -> Result<usize> {
        let blobs = self.blobs.read().await;
        Ok(blobs.names().await?.len())
    }

    async fn query(&self, filter: &ValidatedFilter) -> Result<Vec<MetadataDocument>> {
        let start = Instant::now();
        let documents = {
            let blobs = self.blobs.read().await;
            Self::load_all(&blobs).await?
        };
        let scanned = documents.len();
        let matched = filter_documents(documents.into_values(), filter);

        debug!(
            subsystem = "database",
            component = "document_store",
            op = "query",
            document_count = scanned,
            criteria_count = filter.criteria.len(),
            result_count = matched.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Document scan complete"
        );
        Ok(matched)
    }
}
