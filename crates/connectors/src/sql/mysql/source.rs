use crate::sql::{
    base::{dialect::MySql, error::DbError, query::select::QueryGenerator, source::RowReader},
    mysql::params::{MySqlParamStore, native_value},
};
use async_trait::async_trait;
use futures_util::{
    StreamExt, TryStreamExt, future,
    stream::{self, BoxStream},
};
use model::{
    core::{identifiers::TableRef, value::NativeValue},
    records::token::WorkToken,
};
use mysql_async::{Conn, Row, Value as MySqlValue, prelude::*};
use tracing::debug;

/// Streams rows of one token at a time over a dedicated connection using
/// the binary protocol.
pub struct MySqlRowReader {
    conn: Conn,
    table: TableRef,
    columns: Vec<String>,
    key: Option<String>,
}

impl MySqlRowReader {
    pub fn new(conn: Conn, table: TableRef, columns: Vec<String>, key: Option<String>) -> Self {
        Self {
            conn,
            table,
            columns,
            key,
        }
    }
}

fn row_values(row: Row) -> Result<Vec<NativeValue>, DbError> {
    row.unwrap_raw()
        .into_iter()
        .enumerate()
        .map(|(i, value)| native_value(value.unwrap_or(MySqlValue::NULL), i))
        .collect()
}

#[async_trait]
impl RowReader for MySqlRowReader {
    fn rows<'a>(
        &'a mut self,
        token: &'a WorkToken,
    ) -> BoxStream<'a, Result<Vec<NativeValue>, DbError>> {
        let columns = self.columns.iter().map(String::as_str).collect::<Vec<_>>();
        let query = QueryGenerator::new(&MySql).token_select(
            &self.table,
            &columns,
            self.key.as_deref(),
            token,
        );
        let conn = &mut self.conn;

        stream::once(async move {
            let query = query?;
            debug!(sql = %query.sql, token = %token, "Streaming token");
            let params = MySqlParamStore::from_values(&query.params).into_params();
            let rows = conn.exec_stream::<Row, _, _>(query.sql, params).await?;
            Ok::<_, DbError>(
                rows.map_err(DbError::from)
                    .and_then(|row| future::ready(row_values(row))),
            )
        })
        .try_flatten()
        .boxed()
    }

    async fn close(self: Box<Self>) -> Result<(), DbError> {
        self.conn.disconnect().await?;
        Ok(())
    }
}
