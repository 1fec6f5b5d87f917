//! # folio-db
//!
//! Storage backends for folio metadata.
//!
//! This crate provides:
//! - The document backend: one JSON blob per document, on disk or in memory
//! - The relational backend: SQLite tables queried through compiled predicates
//! - Connection pool management
//! - Migration between backends
//!
//! ## Example
//!
//! ```rust,ignore
//! use folio_db::{open_store, FilterExecutor, FilterConfig, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = open_store(&StoreConfig::from_env()?).await?;
//!     let executor = FilterExecutor::new(store);
//!
//!     let result = executor.execute(&FilterConfig::default()).await?;
//!     println!("{} documents", result.total);
//!     Ok(())
//! }
//! ```
pub mod blob_storage;
pub mod document_store;
pub mod migration;
pub mod pool;
pub mod predicate;
pub mod relational_store;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can share the corpus
pub mod test_fixtures;

use std::sync::Arc;

use tracing::info;

// Re-export core types
pub use folio_core::*;

pub use blob_storage::{blob_name, BlobStorage, FilesystemBlobs, MemoryBlobs};
pub use document_store::DocumentStore;
pub use migration::{migrate, verify_migration, MigrationReport, MigrationVerification};
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use predicate::{FilterQueryBuilder, QueryParam};
pub use relational_store::RelationalStore;

/// Open the store for one backend using the configured locations.
pub async fn open_backend(config: &StoreConfig, kind: BackendKind) -> Result<Arc<dyn MetadataStore>> {
    let store: Arc<dyn MetadataStore> = match kind {
        BackendKind::Document => Arc::new(DocumentStore::filesystem(&config.data_dir)),
        BackendKind::Relational => {
            let pool_config = if pool::is_memory_url(&config.database_url) {
                PoolConfig::in_memory()
            } else {
                PoolConfig::default().max_connections(config.max_connections)
            };
            Arc::new(RelationalStore::connect_with_config(&config.database_url, pool_config).await?)
        }
    };

    info!(
        subsystem = "database",
        component = "store",
        op = "open",
        backend = %kind,
        "Metadata store opened"
    );
    Ok(store)
}

/// Open the active store named by `config.backend`.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn MetadataStore>> {
    config.validate()?;
    open_backend(config, config.backend).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_store_for_each_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            backend: BackendKind::Document,
            data_dir: dir.path().join("metadata"),
            database_url: defaults::MEMORY_DATABASE_URL.to_string(),
            max_connections: 1,
        };

        let document = open_store(&config).await.unwrap();
        assert_eq!(document.kind(), BackendKind::Document);

        let relational = open_store(&config.clone().with_backend(BackendKind::Relational))
            .await
            .unwrap();
        assert_eq!(relational.kind(), BackendKind::Relational);
        assert_eq!(relational.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_open_store_rejects_invalid_config() {
        let config = StoreConfig {
            max_connections: 0,
            ..StoreConfig::default()
        };
        let err = open_store(&config).await.err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }
}
