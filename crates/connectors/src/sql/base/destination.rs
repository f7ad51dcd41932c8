use crate::sql::base::error::{ConnectorError, DbError};
use async_trait::async_trait;
use model::{execution::settings::CopySettings, records::batch::TransformedBatch};

/// Factory for destination-side handles.
#[async_trait]
pub trait DestinationConnector: Send + Sync {
    /// Human-readable endpoint description with credentials removed.
    fn endpoint(&self) -> String;

    async fn open_loader(
        &self,
        settings: &CopySettings,
    ) -> Result<Box<dyn BatchLoader>, ConnectorError>;

    /// Whether the destination table currently holds no rows.
    async fn is_table_empty(&self, settings: &CopySettings) -> Result<bool, ConnectorError>;
}

/// Executes bulk inserts on a private destination connection.
#[async_trait]
pub trait BatchLoader: Send {
    /// Inserts every row of the batch in one statement execution, which
    /// commits on its own. Returns the number of rows inserted.
    async fn load(&mut self, batch: TransformedBatch) -> Result<u64, DbError>;

    async fn close(self: Box<Self>) -> Result<(), DbError>;
}
