use connectors::sql::base::error::ConnectorError;
use engine_processing::error::StageError;
use thiserror::Error;

/// Top-level errors of a copy run.
#[derive(Debug, Error)]
pub enum CopyError {
    /// The first fatal error raised by a pipeline worker.
    #[error("{0}")]
    Stage(#[from] StageError),

    #[error("Destination table {table} is not empty; truncate it before copying")]
    DestinationNotEmpty { table: String },

    #[error("Preflight check failed: {0}")]
    Preflight(#[source] ConnectorError),

    /// Shutdown was requested before every stage drained.
    #[error("The copy was interrupted before completion")]
    Cancelled,

    /// A worker task panicked or was aborted.
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}
