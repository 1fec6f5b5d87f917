//! Filter execution against the active store.
//!
//! The executor owns nothing global: it is handed a store and a registry at
//! construction. It validates the request before touching the store, asks the
//! store for the full filtered set, then applies the limit while keeping the
//! pre-limit total.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::criteria::{FilterConfig, Logic, ValidatedFilter};
use crate::error::Result;
use crate::fields::FieldRegistry;
use crate::models::MetadataDocument;
use crate::traits::{BackendKind, MetadataStore};

/// Filtered, possibly truncated result set.
#[derive(Debug, Clone, Serialize)]
pub struct FilterResult {
    pub documents: Vec<MetadataDocument>,
    /// Matching documents before `limit` was applied.
    pub total: usize,
    pub logic: Logic,
    /// Number of criteria in the request.
    pub criteria: usize,
}

impl FilterResult {
    /// Paths of the returned documents, in order.
    pub fn paths(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.path.as_str()).collect()
    }
}

/// Runs filter requests against one store.
#[derive(Clone)]
pub struct FilterExecutor {
    store: Arc<dyn MetadataStore>,
    registry: &'static FieldRegistry,
}

impl FilterExecutor {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self::with_registry(store, FieldRegistry::standard())
    }

    pub fn with_registry(store: Arc<dyn MetadataStore>, registry: &'static FieldRegistry) -> Self {
        Self { store, registry }
    }

    pub fn backend(&self) -> BackendKind {
        self.store.kind()
    }

    pub fn store(&self) -> &Arc<dyn MetadataStore> {
        &self.store
    }

    /// Validate and run a wire-level request.
    pub async fn execute(&self, config: &FilterConfig) -> Result<FilterResult> {
        let filter = config.validate(self.registry)?;
        self.execute_validated(&filter).await
    }

    /// Run an already validated filter.
    pub async fn execute_validated(&self, filter: &ValidatedFilter) -> Result<FilterResult> {
        let start = Instant::now();
        let mut documents = self.store.query(filter).await?;
        let total = documents.len();
        if let Some(limit) = filter.limit {
            documents.truncate(limit);
        }

        debug!(
            subsystem = "core",
            component = "executor",
            op = "execute",
            backend = %self.store.kind(),
            criteria_count = filter.criteria.len(),
            result_count = documents.len(),
            total,
            duration_ms = start.elapsed().as_millis() as u64,
            "Filter executed"
        );

        Ok(FilterResult {
            documents,
            total,
            logic: filter.logic,
            criteria: filter.criteria.len(),
        })
    }

    /// Every document with no filtering (presentation-layer `GetAll`).
    pub async fn all(&self) -> Result<Vec<MetadataDocument>> {
        Ok(self.store.get_all().await?.into_values().collect())
    }
}
