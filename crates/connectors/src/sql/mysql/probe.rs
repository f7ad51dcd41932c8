use crate::sql::{
    base::{
        dialect::MySql, error::DbError, query::select::QueryGenerator, source::BoundaryProbe,
    },
    mysql::{
        metadata::fetch_partitions,
        params::{MySqlParamStore, native_value},
    },
};
use async_trait::async_trait;
use model::core::{identifiers::TableRef, value::NativeValue};
use mysql_async::{Conn, Row, Value as MySqlValue, prelude::*};
use tracing::trace;

pub struct MySqlBoundaryProbe {
    conn: Conn,
    table: TableRef,
    key: Option<String>,
}

impl MySqlBoundaryProbe {
    pub fn new(conn: Conn, table: TableRef, key: Option<String>) -> Self {
        Self { conn, table, key }
    }
}

#[async_trait]
impl BoundaryProbe for MySqlBoundaryProbe {
    async fn next_boundary(
        &mut self,
        after: Option<&NativeValue>,
        skip: usize,
    ) -> Result<Option<NativeValue>, DbError> {
        let key = self
            .key
            .as_deref()
            .ok_or_else(|| DbError::QueryBuildError("boundary probe without a split key".into()))?;
        let query = QueryGenerator::new(&MySql).boundary_probe(&self.table, key, after, skip);
        trace!(sql = %query.sql, params = ?query.params, "Probing split boundary");

        let params = MySqlParamStore::from_values(&query.params).into_params();
        let row = self.conn.exec_first::<Row, _, _>(query.sql, params).await?;

        row.map(|row| {
            let value = row
                .unwrap_raw()
                .into_iter()
                .next()
                .flatten()
                .unwrap_or(MySqlValue::NULL);
            native_value(value, 0)
        })
        .transpose()
    }

    async fn partitions(&mut self) -> Result<Vec<String>, DbError> {
        fetch_partitions(&mut self.conn, &self.table).await
    }

    async fn close(self: Box<Self>) -> Result<(), DbError> {
        self.conn.disconnect().await?;
        Ok(())
    }
}
