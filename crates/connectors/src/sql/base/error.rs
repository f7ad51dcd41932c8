use thiserror::Error;

/// All errors coming from the database/query layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// MySQL driver error.
    #[error("MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),

    /// PostgreSQL driver error.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// The driver returned a value this connector has no mapping for.
    #[error("Unsupported value in column {column}: {detail}")]
    UnsupportedValue { column: usize, detail: String },

    /// Writing rows to the database failed at the application level.
    #[error("Write error: {0}")]
    Write(String),

    /// An error occurred while building a SQL query.
    #[error("Query build error: {0}")]
    QueryBuildError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Errors happening while opening a connection or describing an endpoint.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    #[error("MySQL connection failed: {0}")]
    MySql(#[from] mysql_async::Error),

    #[error("PostgreSQL connection failed: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("Unexpected response from {endpoint}: {detail}")]
    Unexpected { endpoint: String, detail: String },

    #[error("Table {0} not found")]
    TableNotFound(String),

    #[error(transparent)]
    Db(#[from] DbError),
}
