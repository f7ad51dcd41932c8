use connectors::sql::base::error::{ConnectorError, DbError};
use model::core::{data_type::ColumnKind, identifiers::BatchId};
use thiserror::Error;

/// Errors raised while reshaping a raw batch into typed column arrays.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Column '{column}' holds values of several kinds {kinds:?}")]
    MixedKinds {
        column: String,
        kinds: Vec<ColumnKind>,
    },

    #[error("Column '{column}', row {row}: cannot store {value} as {target}")]
    Incompatible {
        column: String,
        row: usize,
        value: String,
        target: ColumnKind,
    },

    #[error("Batch has {actual} columns, expected {expected}")]
    ColumnCount { expected: usize, actual: usize },
}

/// Every failure a pipeline stage can report. Any error other than a
/// cancellation is fatal for the whole run.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("Failed to connect to {endpoint}: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: ConnectorError,
    },

    #[error("Failed to probe split boundaries: {0}")]
    Probe(#[source] DbError),

    #[error("Split key '{key}' returned a NULL boundary after {after}")]
    NullBoundary { key: String, after: String },

    #[error("Failed to extract {token}: {source}")]
    Extraction {
        token: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to convert batch '{batch}': {source}")]
    Conversion {
        batch: BatchId,
        #[source]
        source: ConversionError,
    },

    #[error("Failed to load batch '{batch}': {source}")]
    Load {
        batch: BatchId,
        #[source]
        source: DbError,
    },

    #[error("The copy was cancelled.")]
    Cancelled,

    #[error("The {0} queue was closed unexpectedly.")]
    QueueClosed(&'static str),
}

impl StageError {
    /// Whether the worker only stopped because shutdown was requested.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, StageError::Cancelled)
    }
}
