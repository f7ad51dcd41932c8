use crate::error::CliError;
use async_trait::async_trait;
use connectors::sql::{
    base::{destination::DestinationConnector, source::SourceConnector},
    mysql::adapter::MySqlSource,
    postgres::adapter::PgDestination,
};
use std::str::FromStr;
use tracing::{error, info};

/// What kind of connection to check
#[derive(Debug, PartialEq, Eq)]
pub enum ConnectionKind {
    MySql,
    Postgres,
}

impl FromStr for ConnectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(ConnectionKind::MySql),
            "pg" | "postgres" | "postgresql" => Ok(ConnectionKind::Postgres),
            other => Err(format!("Unknown connection kind: {other}")),
        }
    }
}

impl ConnectionKind {
    pub fn pinger(self, conn_str: String) -> Box<dyn ConnectionPinger> {
        match self {
            ConnectionKind::MySql => Box::new(MySqlConnectionPinger { conn_str }),
            ConnectionKind::Postgres => Box::new(PostgresConnectionPinger { conn_str }),
        }
    }
}

/// Trait for "pinging" a data source
#[async_trait]
pub trait ConnectionPinger: Send + Sync {
    /// Attempts to ping; returns Err if unreachable
    async fn ping(&self) -> Result<(), CliError>;
}

pub struct MySqlConnectionPinger {
    pub conn_str: String,
}

pub struct PostgresConnectionPinger {
    pub conn_str: String,
}

#[async_trait]
impl ConnectionPinger for MySqlConnectionPinger {
    async fn ping(&self) -> Result<(), CliError> {
        let source = MySqlSource::new(&self.conn_str)?;
        let endpoint = source.endpoint();
        info!(%endpoint, "Pinging MySQL");

        source.ping().await.map_err(|err| {
            error!(%endpoint, %err, "MySQL ping failed");
            CliError::Connector(err)
        })?;

        info!(%endpoint, "MySQL ping succeeded");
        Ok(())
    }
}

#[async_trait]
impl ConnectionPinger for PostgresConnectionPinger {
    async fn ping(&self) -> Result<(), CliError> {
        let destination = PgDestination::new(&self.conn_str)?;
        let endpoint = destination.endpoint();
        info!(%endpoint, "Pinging Postgres");

        destination.ping().await.map_err(|err| {
            error!(%endpoint, %err, "Postgres ping failed");
            CliError::Connector(err)
        })?;

        info!(%endpoint, "Postgres ping succeeded");
        Ok(())
    }
}
