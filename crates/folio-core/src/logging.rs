//! Structured logging field name constants for folio.
//!
//! The canonical names of the structured fields emitted by every crate. Log
//! call sites spell the names inline; this module is the reference list they
//! keep to, so log aggregation can query by the same names everywhere.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Aborted migration, storage failure surfaced to the caller |
//! | WARN  | Per-document evaluation error (criterion treated as non-matching) |
//! | INFO  | Lifecycle events, bulk writes, completed migrations |
//! | DEBUG | Compiled predicates, query timings, config choices |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "core", "database", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "document_store", "relational_store", "executor", "migration"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "set", "bulk_set", "query", "migrate"
pub const OPERATION: &str = "op";

/// Backend kind ("document", "relational").
pub const BACKEND: &str = "backend";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Document path being operated on.
pub const PATH: &str = "path";

/// Field name referenced by a criterion.
pub const FIELD: &str = "field";

/// Operator referenced by a criterion.
pub const OPERATOR: &str = "operator";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of documents returned by a query.
pub const RESULT_COUNT: &str = "result_count";

/// Number of documents written or copied.
pub const DOCUMENT_COUNT: &str = "document_count";

/// Number of stale documents deleted when a store is replaced.
pub const REMOVED_COUNT: &str = "removed_count";

/// Number of criteria in a filter config.
pub const CRITERIA_COUNT: &str = "criteria_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
