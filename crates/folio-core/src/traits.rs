//! Core traits for folio storage abstractions.
//!
//! Backends implement [`MetadataStore`]; callers hold explicit handles
//! (usually `Arc<dyn MetadataStore>`) instead of reaching for global state.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::criteria::ValidatedFilter;
use crate::error::{Error, Result};
use crate::models::MetadataDocument;

/// Storage engine identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// One serialized blob per document, queried by full scan.
    Document,
    /// Typed columns plus multi-valued rows, queried by compiled predicates.
    Relational,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Relational => "relational",
        }
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "document" | "file" | "memory" => Ok(Self::Document),
            "relational" | "sqlite" | "sql" => Ok(Self::Relational),
            _ => Err(Error::Config(format!("unknown backend '{}'", s))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository for metadata documents.
///
/// Writes replace whole documents keyed by `path`. `query` returns every
/// matching document ordered by path; truncation to a limit is the caller's
/// job so that totals can be reported.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Which engine this is.
    fn kind(&self) -> BackendKind;

    /// Insert or replace one document.
    async fn set(&self, document: MetadataDocument) -> Result<()>;

    /// Insert or replace many documents.
    ///
    /// Atomicity is backend-specific: the relational backend commits all or
    /// nothing, the document backend writes one by one.
    async fn bulk_set(&self, documents: Vec<MetadataDocument>) -> Result<()>;

    /// Make the store hold exactly `documents`.
    ///
    /// Every document is written and every stored path not among them is
    /// deleted. Returns the number of documents deleted. Atomicity follows
    /// [`MetadataStore::bulk_set`].
    async fn replace_all(&self, documents: Vec<MetadataDocument>) -> Result<usize>;

    /// Delete by path. Returns whether a document existed.
    async fn delete(&self, path: &str) -> Result<bool>;

    /// Fetch by path.
    async fn get(&self, path: &str) -> Result<Option<MetadataDocument>>;

    /// Every stored document keyed by path.
    async fn get_all(&self) -> Result<BTreeMap<String, MetadataDocument>>;

    /// Number of stored documents.
    async fn len(&self) -> Result<usize> {
        Ok(self.get_all().await?.len())
    }

    /// Every document passing the filter, ordered by path.
    async fn query(&self, filter: &ValidatedFilter) -> Result<Vec<MetadataDocument>>;
}
