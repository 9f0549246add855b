// crates/pulse-core/src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PulseError>;

/// Every failure the ingestion and query paths can produce.
///
/// The variants group into three kinds, matching how callers react:
/// parse failures abort an ingestion run, storage failures abort a load,
/// and query failures abort a single dashboard request.
#[derive(Debug, Error)]
pub enum PulseError {
    /// Malformed JSON, a document that does not match its category schema,
    /// or a source path that does not decode into state/year/quarter.
    #[error("parse error in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("storage error: {0}")]
    Storage(#[source] rusqlite::Error),

    /// A record was handed to a table it does not belong to.
    #[error("storage error: {0}")]
    StorageShape(String),

    #[error("query error: {message}")]
    Query {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PulseError {
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            source: None,
        }
    }

    pub fn query_backend(err: rusqlite::Error) -> Self {
        Self::Query {
            message: err.to_string(),
            source: Some(err),
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::StorageShape(_))
    }

    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query { .. })
    }
}
