//! # folio-core
//!
//! Core types, traits, and filter evaluation for folio metadata.
//!
//! This crate holds everything that does not depend on a storage engine: the
//! document model, the field registry, filter validation, in-memory operator
//! evaluation, and the [`MetadataStore`] trait that storage crates implement.

pub mod combination;
pub mod config;
pub mod criteria;
pub mod defaults;
pub mod error;
pub mod executor;
pub mod fields;
pub mod logging;
pub mod models;
pub mod operators;
pub mod traits;

// Re-export commonly used types at crate root
pub use combination::{criterion_matches, document_matches, filter_documents};
pub use config::StoreConfig;
pub use criteria::{
    Action, Criterion, FilterConfig, Literal, Logic, Operator, ValidatedCriterion, ValidatedFilter,
};
pub use error::{Error, Result};
pub use executor::{FilterExecutor, FilterResult};
pub use fields::{FieldDescriptor, FieldRegistry, FieldSlot, ValueType, FIELDS};
pub use models::{FieldValue, MetadataDocument, Para, Priority, Status};
pub use operators::{evaluate, fold_case};
pub use traits::*;
