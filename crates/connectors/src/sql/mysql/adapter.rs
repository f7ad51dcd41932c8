use crate::sql::{
    base::{
        error::ConnectorError,
        metadata::TableMetadata,
        source::{BoundaryProbe, RowReader, SourceConnector},
    },
    mysql::{metadata::fetch_table_metadata, probe::MySqlBoundaryProbe, source::MySqlRowReader},
};
use async_trait::async_trait;
use model::{
    core::identifiers::TableRef,
    execution::settings::{CopySettings, SplitMode},
};
use mysql_async::{Conn, Opts, prelude::*};
use tracing::{debug, info};

/// MySQL/MariaDB source. Holds parsed connection options and opens a new
/// connection for every probe or reader.
#[derive(Clone)]
pub struct MySqlSource {
    opts: Opts,
}

impl MySqlSource {
    pub fn new(url: &str) -> Result<Self, ConnectorError> {
        let opts = Opts::from_url(url).map_err(|e| ConnectorError::InvalidUrl(e.to_string()))?;
        Ok(Self { opts })
    }

    pub async fn connect(&self) -> Result<Conn, ConnectorError> {
        let conn = Conn::new(self.opts.clone()).await?;
        debug!(endpoint = %self.endpoint(), "Opened MySQL connection");
        Ok(conn)
    }

    /// Runs `SELECT 1` on a fresh connection.
    pub async fn ping(&self) -> Result<(), ConnectorError> {
        let mut conn = self.connect().await?;
        let value: Option<i32> = conn.query_first("SELECT 1").await?;
        conn.disconnect().await?;
        match value {
            Some(1) => Ok(()),
            other => Err(ConnectorError::Unexpected {
                endpoint: self.endpoint(),
                detail: format!("ping returned {other:?}"),
            }),
        }
    }

    pub async fn describe(&self, table: &TableRef) -> Result<TableMetadata, ConnectorError> {
        let mut conn = self.connect().await?;
        let metadata = fetch_table_metadata(&mut conn, table).await;
        conn.disconnect().await?;
        let metadata = metadata?;
        if metadata.columns.is_empty() {
            return Err(ConnectorError::TableNotFound(table.to_string()));
        }
        info!(
            table = %table,
            columns = metadata.columns.len(),
            partitions = metadata.partitions.len(),
            "Described source table"
        );
        Ok(metadata)
    }

    fn split_key(settings: &CopySettings) -> Option<String> {
        match &settings.split {
            SplitMode::KeyRange { key } => Some(key.clone()),
            SplitMode::Partitioned => None,
        }
    }
}

#[async_trait]
impl SourceConnector for MySqlSource {
    fn endpoint(&self) -> String {
        format!(
            "mysql://{}:{}/{}",
            self.opts.ip_or_hostname(),
            self.opts.tcp_port(),
            self.opts.db_name().unwrap_or_default()
        )
    }

    async fn open_probe(
        &self,
        settings: &CopySettings,
    ) -> Result<Box<dyn BoundaryProbe>, ConnectorError> {
        let conn = self.connect().await?;
        Ok(Box::new(MySqlBoundaryProbe::new(
            conn,
            settings.source_table.clone(),
            Self::split_key(settings),
        )))
    }

    async fn open_reader(
        &self,
        settings: &CopySettings,
    ) -> Result<Box<dyn RowReader>, ConnectorError> {
        let conn = self.connect().await?;
        let columns = settings.columns.iter().map(|c| c.name.clone()).collect();
        Ok(Box::new(MySqlRowReader::new(
            conn,
            settings.source_table.clone(),
            columns,
            Self::split_key(settings),
        )))
    }
}
