use crate::sql::{
    base::{
        destination::BatchLoader,
        dialect::Postgres,
        error::DbError,
        query::loader::{BoundColumn, unnest_insert},
    },
    postgres::{
        data_type::{PgColumnKind, element_cast},
        params::PgParamStore,
    },
};
use async_trait::async_trait;
use model::{
    core::{data_type::ColumnKind, identifiers::TableRef},
    execution::settings::ColumnSpec,
    records::batch::TransformedBatch,
};
use std::collections::HashMap;
use tokio_postgres::{Client, Statement, types::Type};
use tracing::debug;

/// Loads batches with one `INSERT ... SELECT FROM UNNEST(...)` execution
/// per batch. Statements are prepared once per column-kind signature.
pub struct PgBatchLoader {
    client: Client,
    table: TableRef,
    columns: Vec<ColumnSpec>,
    statements: HashMap<Vec<ColumnKind>, Statement>,
}

impl PgBatchLoader {
    pub fn new(client: Client, table: TableRef, columns: Vec<ColumnSpec>) -> Self {
        Self {
            client,
            table,
            columns,
            statements: HashMap::new(),
        }
    }

    async fn statement_for(&mut self, signature: Vec<ColumnKind>) -> Result<Statement, DbError> {
        if let Some(statement) = self.statements.get(&signature) {
            return Ok(statement.clone());
        }

        let sql = insert_sql(&self.table, &self.columns, &signature);
        let types = signature.iter().map(|k| k.array_type()).collect::<Vec<Type>>();
        let statement = self.client.prepare_typed(&sql, &types).await?;
        debug!(table = %self.table, sql = %sql, "Prepared bulk insert");

        self.statements.insert(signature, statement.clone());
        Ok(statement)
    }
}

/// Bulk insert for one column-kind signature. Elements are cast only where
/// the insert's own assignment cast would not apply.
pub fn insert_sql(table: &TableRef, columns: &[ColumnSpec], signature: &[ColumnKind]) -> String {
    let casts = columns
        .iter()
        .zip(signature)
        .map(|(column, kind)| {
            column
                .dest_type
                .as_deref()
                .and_then(|dest| element_cast(*kind, dest))
        })
        .collect::<Vec<_>>();

    let bound = columns
        .iter()
        .zip(signature)
        .zip(&casts)
        .map(|((column, kind), cast)| BoundColumn {
            name: &column.name,
            array_type: kind.array_type_name(),
            cast: cast.as_deref(),
        })
        .collect::<Vec<_>>();
    unnest_insert(&Postgres, table, &bound)
}

#[async_trait]
impl BatchLoader for PgBatchLoader {
    async fn load(&mut self, batch: TransformedBatch) -> Result<u64, DbError> {
        if batch.columns.len() != self.columns.len() {
            return Err(DbError::Write(format!(
                "batch {} has {} columns, table {} expects {}",
                batch.id,
                batch.columns.len(),
                self.table,
                self.columns.len()
            )));
        }

        let statement = self.statement_for(batch.signature()).await?;
        let params = PgParamStore::from_columns(batch.columns);
        let inserted = self.client.execute(&statement, &params.as_refs()).await?;
        Ok(inserted)
    }

    async fn close(self: Box<Self>) -> Result<(), DbError> {
        // Dropping the client ends the spawned connection task.
        drop(self.client);
        Ok(())
    }
}
