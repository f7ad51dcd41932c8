use crate::sql::{
    base::{
        destination::{BatchLoader, DestinationConnector},
        error::ConnectorError,
        metadata::TableMetadata,
    },
    postgres::{
        loader::PgBatchLoader,
        metadata::{fetch_table_metadata, table_is_empty},
        utils::{connect_client, describe_endpoint, parse_config},
    },
};
use async_trait::async_trait;
use model::{core::identifiers::TableRef, execution::settings::CopySettings};
use tokio_postgres::Client;
use tracing::{debug, info};

/// PostgreSQL destination. Every loader gets its own client.
#[derive(Clone)]
pub struct PgDestination {
    url: String,
    endpoint: String,
}

impl PgDestination {
    pub fn new(url: &str) -> Result<Self, ConnectorError> {
        let config = parse_config(url)?;
        Ok(Self {
            url: url.to_string(),
            endpoint: describe_endpoint(&config),
        })
    }

    pub async fn connect(&self) -> Result<Client, ConnectorError> {
        let client = connect_client(&self.url).await?;
        debug!(endpoint = %self.endpoint, "Opened Postgres connection");
        Ok(client)
    }

    /// Runs `SELECT 1` on a fresh connection.
    pub async fn ping(&self) -> Result<(), ConnectorError> {
        let client = self.connect().await?;
        let row = client.query_one("SELECT 1", &[]).await?;
        let value: i32 = row.try_get(0)?;
        if value != 1 {
            return Err(ConnectorError::Unexpected {
                endpoint: self.endpoint.clone(),
                detail: format!("ping returned {value}"),
            });
        }
        Ok(())
    }

    pub async fn describe(&self, table: &TableRef) -> Result<TableMetadata, ConnectorError> {
        let client = self.connect().await?;
        let metadata = fetch_table_metadata(&client, table).await?;
        if metadata.columns.is_empty() {
            return Err(ConnectorError::TableNotFound(table.to_string()));
        }
        info!(
            table = %table,
            columns = metadata.columns.len(),
            "Described destination table"
        );
        Ok(metadata)
    }
}

#[async_trait]
impl DestinationConnector for PgDestination {
    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    async fn open_loader(
        &self,
        settings: &CopySettings,
    ) -> Result<Box<dyn BatchLoader>, ConnectorError> {
        let client = self.connect().await?;
        Ok(Box::new(PgBatchLoader::new(
            client,
            settings.dest_table.clone(),
            settings.columns.clone(),
        )))
    }

    async fn is_table_empty(&self, settings: &CopySettings) -> Result<bool, ConnectorError> {
        let client = self.connect().await?;
        Ok(table_is_empty(&client, &settings.dest_table).await?)
    }
}
