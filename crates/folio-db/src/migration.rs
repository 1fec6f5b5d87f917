//! Copy every document from one store to another.
//!
//! Migration is a plain `get_all` on the source followed by one
//! `replace_all` on the destination: documents are copied without
//! transformation and destination documents the source does not have are
//! deleted, so both stores answer every query the same afterwards. Against a
//! relational destination the copy is all-or-nothing, against a document
//! destination a failure may leave it partially populated and the migration
//! must be re-run.

use std::time::Instant;

use serde::Serialize;
use tracing::{error, info};

use folio_core::{BackendKind, MetadataStore, Result};

/// Outcome of a completed migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub source: BackendKind,
    pub destination: BackendKind,
    /// Documents written to the destination.
    pub copied: usize,
    /// Destination documents deleted because the source lacks them.
    pub removed: usize,
    pub duration_ms: u64,
}

/// Differences between source and destination after a migration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationVerification {
    /// Paths present in the source but not the destination.
    pub missing: Vec<String>,
    /// Paths whose destination document differs from the source.
    pub differing: Vec<String>,
    /// Paths present in the destination but not the source.
    pub extra: Vec<String>,
}

impl MigrationVerification {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.differing.is_empty() && self.extra.is_empty()
    }
}

/// Make `destination` hold exactly the documents of `source`.
pub async fn migrate(
    source: &dyn MetadataStore,
    destination: &dyn MetadataStore,
) -> Result<MigrationReport> {
    let start = Instant::now();
    info!(
        subsystem = "database",
        component = "migration",
        op = "start",
        source = %source.kind(),
        destination = %destination.kind(),
        "Starting metadata migration"
    );

    let documents = source.get_all().await.map_err(|e| {
        error!(
            subsystem = "database",
            component = "migration",
            op = "read_source",
            source = %source.kind(),
            error = %e,
            "Migration aborted: could not read source"
        );
        e
    })?;
    let copied = documents.len();

    let removed = destination
        .replace_all(documents.into_values().collect())
        .await
        .map_err(|e| {
            error!(
                subsystem = "database",
                component = "migration",
                op = "write_destination",
                destination = %destination.kind(),
                document_count = copied,
                error = %e,
                "Migration aborted: could not write destination"
            );
            e
        })?;

    let report = MigrationReport {
        source: source.kind(),
        destination: destination.kind(),
        copied,
        removed,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        subsystem = "database",
        component = "migration",
        op = "complete",
        source = %report.source,
        destination = %report.destination,
        document_count = report.copied,
        removed_count = report.removed,
        duration_ms = report.duration_ms,
        "Metadata migration complete"
    );
    Ok(report)
}

/// Compare source and destination path by path.
pub async fn verify_migration(
    source: &dyn MetadataStore,
    destination: &dyn MetadataStore,
) -> Result<MigrationVerification> {
    let expected = source.get_all().await?;
    let actual = destination.get_all().await?;

    let mut verification = MigrationVerification::default();
    for (path, document) in &expected {
        match actual.get(path) {
            None => verification.missing.push(path.clone()),
            Some(copy) if copy != document => verification.differing.push(path.clone()),
            Some(_) => {}
        }
    }
    verification.extra = actual
        .keys()
        .filter(|path| !expected.contains_key(*path))
        .cloned()
        .collect();
    Ok(verification)
}
