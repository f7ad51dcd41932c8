use crate::sql::base::dialect::Dialect;
use model::core::identifiers::TableRef;

/// One target column of an array-bound insert.
#[derive(Debug, Clone)]
pub struct BoundColumn<'a> {
    pub name: &'a str,
    /// Array type of the bound parameter, e.g. `int8[]`.
    pub array_type: &'a str,
    /// Destination type the unnested element is cast to, if any.
    pub cast: Option<&'a str>,
}

/// Builds an insert that takes one array parameter per column and expands
/// them row-wise with `UNNEST`, so a whole batch binds in one execution.
pub fn unnest_insert(dialect: &dyn Dialect, table: &TableRef, columns: &[BoundColumn]) -> String {
    let target = dialect.qualified_table(table);
    let names = columns
        .iter()
        .map(|c| dialect.quote_identifier(c.name))
        .collect::<Vec<_>>();

    let projection = columns
        .iter()
        .zip(&names)
        .map(|(col, quoted)| match col.cast {
            Some(cast) => format!("u.{quoted}::{cast}"),
            None => format!("u.{quoted}"),
        })
        .collect::<Vec<_>>()
        .join(", ");

    let arrays = columns
        .iter()
        .enumerate()
        .map(|(i, col)| format!("{}::{}", dialect.placeholder(i), col.array_type))
        .collect::<Vec<_>>()
        .join(", ");

    let names = names.join(", ");
    format!("INSERT INTO {target} ({names}) SELECT {projection} FROM UNNEST({arrays}) AS u({names})")
}
