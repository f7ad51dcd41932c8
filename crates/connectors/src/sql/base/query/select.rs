use crate::sql::base::{dialect::Dialect, error::DbError};
use model::{
    core::{identifiers::TableRef, value::NativeValue},
    records::token::{KeyRange, WorkToken},
};

/// SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub sql: String,
    pub params: Vec<NativeValue>,
}

pub struct QueryGenerator<'a> {
    dialect: &'a dyn Dialect,
}

impl<'a> QueryGenerator<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self { dialect }
    }

    /// `SELECT key FROM t [WHERE key > ?] ORDER BY key LIMIT 1 OFFSET skip`
    pub fn boundary_probe(
        &self,
        table: &TableRef,
        key: &str,
        after: Option<&NativeValue>,
        skip: usize,
    ) -> SelectQuery {
        let key = self.dialect.quote_identifier(key);
        let table = self.dialect.qualified_table(table);
        let mut params = Vec::new();
        let filter = match after {
            Some(value) => {
                params.push(value.clone());
                format!(" WHERE {key} > {}", self.dialect.placeholder(0))
            }
            None => String::new(),
        };
        SelectQuery {
            sql: format!("SELECT {key} FROM {table}{filter} ORDER BY {key} LIMIT 1 OFFSET {skip}"),
            params,
        }
    }

    /// Projection of `columns` restricted to the rows a token covers.
    pub fn token_select(
        &self,
        table: &TableRef,
        columns: &[&str],
        key: Option<&str>,
        token: &WorkToken,
    ) -> Result<SelectQuery, DbError> {
        let projection = self.dialect.column_list(columns);
        let table = self.dialect.qualified_table(table);
        match token {
            WorkToken::Partition(name) => Ok(SelectQuery {
                sql: format!(
                    "SELECT {projection} FROM {table} PARTITION ({})",
                    self.dialect.quote_identifier(name)
                ),
                params: Vec::new(),
            }),
            WorkToken::Range(range) if range.is_full() => Ok(SelectQuery {
                sql: format!("SELECT {projection} FROM {table}"),
                params: Vec::new(),
            }),
            WorkToken::Range(range) => {
                let key = key.ok_or_else(|| {
                    DbError::QueryBuildError("range token without a split key".into())
                })?;
                let (predicate, params) = self.range_predicate(key, range);
                Ok(SelectQuery {
                    sql: format!("SELECT {projection} FROM {table} WHERE {predicate}"),
                    params,
                })
            }
        }
    }

    fn range_predicate(&self, key: &str, range: &KeyRange) -> (String, Vec<NativeValue>) {
        let key = self.dialect.quote_identifier(key);
        let mut clauses = Vec::with_capacity(2);
        let mut params = Vec::with_capacity(2);
        if let Some(begin) = &range.begin {
            clauses.push(format!("{key} > {}", self.dialect.placeholder(params.len())));
            params.push(begin.clone());
        }
        if let Some(end) = &range.end {
            clauses.push(format!("{key} <= {}", self.dialect.placeholder(params.len())));
            params.push(end.clone());
        }
        (clauses.join(" AND "), params)
    }
}
