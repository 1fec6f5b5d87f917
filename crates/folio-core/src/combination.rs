//! Include/exclude combination over a document.
//!
//! Excludes are checked first and always win: a document matching any
//! exclude criterion is rejected whatever the includes say. With no include
//! criteria the document passes; otherwise `logic` decides between
//! any-include (`or`) and all-includes (`and`).
//!
//! Evaluation errors count as "criterion does not match" and are logged at
//! WARN so they stay visible.

use tracing::warn;

use crate::criteria::{Logic, ValidatedCriterion, ValidatedFilter};
use crate::models::MetadataDocument;
use crate::operators::evaluate;

/// Whether one criterion matches the document; errors are logged and read as `false`.
pub fn criterion_matches(doc: &MetadataDocument, criterion: &ValidatedCriterion) -> bool {
    let value = doc.value_of(criterion.field.slot);
    match evaluate(criterion.operator, value, &criterion.literal) {
        Ok(matched) => matched,
        Err(e) => {
            warn!(
                subsystem = "core",
                component = "combination",
                path = %doc.path,
                field = criterion.field.name,
                operator = %criterion.operator,
                error = %e,
                "Criterion evaluation failed; treating as non-matching"
            );
            false
        }
    }
}

/// Whether the document passes the whole filter.
pub fn document_matches(doc: &MetadataDocument, filter: &ValidatedFilter) -> bool {
    if filter.excludes().any(|c| criterion_matches(doc, c)) {
        return false;
    }

    let mut includes = filter.includes().peekable();
    if includes.peek().is_none() {
        return true;
    }

    match filter.logic {
        Logic::Or => includes.any(|c| criterion_matches(doc, c)),
        Logic::And => includes.all(|c| criterion_matches(doc, c)),
    }
}

/// Filter documents in order, keeping those that pass.
pub fn filter_documents<I>(documents: I, filter: &ValidatedFilter) -> Vec<MetadataDocument>
where
    I: IntoIterator<Item = MetadataDocument>,
{
    documents
        .into_iter()
        .filter(|doc| document_matches(doc, filter))
        .collect()
}
