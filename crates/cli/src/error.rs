use crate::shutdown::ExitCode;
use connectors::sql::base::error::ConnectorError;
use engine_config::error::ConfigError;
use engine_runtime::error::CopyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Copy failed: {0}")]
    Copy(#[from] CopyError),

    #[error("Connection check failed: {0}")]
    Connector(#[from] ConnectorError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Invalid connection format provided: {0}")]
    InvalidConnectionFormat(String),

    #[error("Shutdown requested")]
    ShutdownRequested,
}

impl CliError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::ShutdownRequested | CliError::Copy(CopyError::Cancelled) => {
                ExitCode::ShutdownRequested
            }
            _ => ExitCode::GeneralError,
        }
    }
}
