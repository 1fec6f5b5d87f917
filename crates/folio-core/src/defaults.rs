//! Centralized default constants for folio.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates and the CLI reference these constants instead of defining their
//! own magic numbers.

// =============================================================================
// STORAGE
// =============================================================================

/// Backend used when `FOLIO_BACKEND` is unset.
pub const BACKEND: &str = "relational";

/// Directory holding one JSON blob per document for the document backend.
pub const DATA_DIR: &str = "data/metadata";

/// SQLite URL for the relational backend (`mode=rwc` creates the file).
pub const DATABASE_URL: &str = "sqlite://data/metadata.db?mode=rwc";

/// In-memory SQLite URL used by tests and ephemeral stores.
pub const MEMORY_DATABASE_URL: &str = "sqlite::memory:";

/// File extension for document blobs.
pub const BLOB_EXTENSION: &str = "json";

// =============================================================================
// POOL
// =============================================================================

/// Default maximum number of connections in the relational pool.
pub const MAX_CONNECTIONS: u32 = 5;

/// Default connection acquire timeout in seconds.
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default idle timeout in seconds.
pub const IDLE_TIMEOUT_SECS: u64 = 600;

// =============================================================================
// FILTERING
// =============================================================================

/// Limit value meaning "return every matching document".
pub const UNLIMITED: i64 = 0;

/// Separator for `in` value lists.
pub const LIST_SEPARATOR: char = ',';

/// Date-only literal format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
