use crate::sql::base::{
    error::DbError,
    metadata::{ColumnMetadata, TableMetadata},
};
use model::core::identifiers::TableRef;
use mysql_async::{Conn, prelude::*};
use tracing::debug;

const QUERY_TABLE_COLUMNS_SQL: &str = include_str!("sql/table_columns.sql");
const QUERY_TABLE_PRIMARY_KEY_SQL: &str = include_str!("sql/table_primary_key.sql");
const QUERY_TABLE_PARTITIONS_SQL: &str = include_str!("sql/table_partitions.sql");

/// Reads columns, primary key and partitions of `table`. A table without a
/// schema resolves against the connection's default database.
pub async fn fetch_table_metadata(
    conn: &mut Conn,
    table: &TableRef,
) -> Result<TableMetadata, DbError> {
    let params = (table.schema(), table.name());

    let columns = conn
        .exec::<(String, String, u64), _, _>(QUERY_TABLE_COLUMNS_SQL, params)
        .await?
        .into_iter()
        .map(|(name, data_type, ordinal)| ColumnMetadata {
            ordinal: ordinal as usize,
            name,
            data_type,
        })
        .collect::<Vec<_>>();

    let primary_key = conn
        .exec::<String, _, _>(QUERY_TABLE_PRIMARY_KEY_SQL, params)
        .await?;

    let partitions = fetch_partitions(conn, table).await?;

    debug!(
        table = %table,
        columns = columns.len(),
        primary_key = ?primary_key,
        partitions = partitions.len(),
        "Fetched MySQL table metadata"
    );

    Ok(TableMetadata {
        columns,
        primary_key,
        partitions,
    })
}

pub async fn fetch_partitions(conn: &mut Conn, table: &TableRef) -> Result<Vec<String>, DbError> {
    let partitions = conn
        .exec::<String, _, _>(QUERY_TABLE_PARTITIONS_SQL, (table.schema(), table.name()))
        .await?;
    Ok(partitions)
}
