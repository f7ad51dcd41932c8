use connectors::sql::base::error::ConnectorError;
use thiserror::Error;

/// Errors raised while turning command-line options into copy settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid table name '{0}', expected [schema.]table")]
    InvalidTable(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// The source has neither partitions nor a primary key to split on.
    #[error("Table {0} has no primary key and no partitions to split on")]
    NoSplitKey(String),

    #[error("Destination column '{column}' has no counterpart in source table {table}")]
    MissingSourceColumn { table: String, column: String },

    #[error("Destination table {0} has no columns")]
    NoColumns(String),

    /// A catalog lookup or connection attempt failed.
    #[error("{0}")]
    Connector(#[from] ConnectorError),
}
