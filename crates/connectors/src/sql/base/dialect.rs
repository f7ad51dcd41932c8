//! Identifier quoting and placeholder syntax per database.

use model::core::identifiers::TableRef;

pub trait Dialect: Send + Sync {
    /// Wraps an identifier in the dialect's quotes, doubling any embedded
    /// quote character.
    ///
    /// - PostgreSQL uses double quotes: `"my_column"`
    /// - MySQL uses backticks: `` `my_column` ``
    fn quote_identifier(&self, ident: &str) -> String;

    /// Placeholder for the zero-based parameter `index`.
    fn placeholder(&self, index: usize) -> String;

    fn qualified_table(&self, table: &TableRef) -> String {
        match table.schema() {
            Some(schema) => format!(
                "{}.{}",
                self.quote_identifier(schema),
                self.quote_identifier(table.name())
            ),
            None => self.quote_identifier(table.name()),
        }
    }

    fn column_list(&self, columns: &[&str]) -> String {
        columns
            .iter()
            .map(|c| self.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl Dialect for MySql {
    fn quote_identifier(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl Dialect for Postgres {
    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#""{}""#, ident.replace('"', r#""""#))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index + 1)
    }
}
