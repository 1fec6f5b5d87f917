//! Error types for folio.

use thiserror::Error;

/// Result type alias using folio's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for folio operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Criterion names a field the registry does not know.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Operator is not accepted for the target field or value type.
    #[error("Unsupported operator '{operator}' for {target}")]
    UnsupportedOperator { target: String, operator: String },

    /// Literal value cannot be parsed for the field's type.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Criterion action is neither include nor exclude.
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Filter logic is neither and nor or.
    #[error("Invalid logic: {0}")]
    InvalidLogic(String),

    /// A criterion inside a filter config failed validation.
    #[error("Criterion {index}: {source}")]
    InvalidCriterion {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    /// The backend cannot express the criterion in its native query form.
    #[error("Unsupported compilation: {0}")]
    UnsupportedCompilation(String),

    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for backend read/write failures (database, filesystem, blob decoding).
    pub fn is_storage_io(&self) -> bool {
        matches!(
            self,
            Error::Database(_) | Error::Io(_) | Error::Serialization(_)
        )
    }

    /// Innermost error, unwrapping criterion index tags.
    pub fn root(&self) -> &Error {
        match self {
            Error::InvalidCriterion { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
