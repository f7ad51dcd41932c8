use crate::sql::base::{
    dialect::{Dialect, Postgres},
    error::DbError,
    metadata::{ColumnMetadata, TableMetadata},
};
use model::core::identifiers::TableRef;
use tokio_postgres::Client;
use tracing::debug;

const QUERY_TABLE_COLUMNS_SQL: &str = include_str!("sql/table_columns.sql");
const QUERY_TABLE_PRIMARY_KEY_SQL: &str = include_str!("sql/table_primary_key.sql");

/// Reads insertable columns (no dropped or generated ones) and the primary
/// key. An unqualified table resolves through the search path.
pub async fn fetch_table_metadata(
    client: &Client,
    table: &TableRef,
) -> Result<TableMetadata, DbError> {
    let regclass = Postgres.qualified_table(table);

    let columns = client
        .query(QUERY_TABLE_COLUMNS_SQL, &[&regclass])
        .await?
        .iter()
        .map(|row| -> Result<ColumnMetadata, DbError> {
            let ordinal: i32 = row.try_get(2)?;
            Ok(ColumnMetadata {
                ordinal: ordinal as usize,
                name: row.try_get(0)?,
                data_type: row.try_get(1)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let primary_key = client
        .query(QUERY_TABLE_PRIMARY_KEY_SQL, &[&regclass])
        .await?
        .iter()
        .map(|row| row.try_get::<_, String>(0))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(table = %table, columns = columns.len(), "Fetched Postgres table metadata");

    Ok(TableMetadata {
        columns,
        primary_key,
        partitions: Vec::new(),
    })
}

pub async fn table_is_empty(client: &Client, table: &TableRef) -> Result<bool, DbError> {
    let sql = format!("SELECT 1 FROM {} LIMIT 1", Postgres.qualified_table(table));
    let row = client.query_opt(&sql, &[]).await?;
    Ok(row.is_none())
}
