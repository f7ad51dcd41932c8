use crate::sql::base::error::{ConnectorError, DbError};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use model::{
    core::value::NativeValue, execution::settings::CopySettings, records::token::WorkToken,
};

/// Factory for source-side handles. Every pipeline worker opens its own
/// handle; handles are never shared between workers.
#[async_trait]
pub trait SourceConnector: Send + Sync {
    /// Human-readable endpoint description with credentials removed.
    fn endpoint(&self) -> String;

    async fn open_probe(
        &self,
        settings: &CopySettings,
    ) -> Result<Box<dyn BoundaryProbe>, ConnectorError>;

    async fn open_reader(&self, settings: &CopySettings)
    -> Result<Box<dyn RowReader>, ConnectorError>;
}

/// Queries used to divide the source table into work tokens.
#[async_trait]
pub trait BoundaryProbe: Send {
    /// Returns the key found `skip` rows past the first key strictly
    /// greater than `after` (or past the smallest key when `after` is
    /// `None`), in ascending key order. `None` when no such row exists.
    async fn next_boundary(
        &mut self,
        after: Option<&NativeValue>,
        skip: usize,
    ) -> Result<Option<NativeValue>, DbError>;

    /// Partition names of the source table, each exactly once.
    async fn partitions(&mut self) -> Result<Vec<String>, DbError>;

    async fn close(self: Box<Self>) -> Result<(), DbError>;
}

/// Streams the projected columns of the rows covered by a token.
#[async_trait]
pub trait RowReader: Send {
    fn rows<'a>(
        &'a mut self,
        token: &'a WorkToken,
    ) -> BoxStream<'a, Result<Vec<NativeValue>, DbError>>;

    async fn close(self: Box<Self>) -> Result<(), DbError>;
}
