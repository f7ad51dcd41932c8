use serde::Serialize;

/// A column as described by a database catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMetadata {
    /// One-based position in the table.
    pub ordinal: usize,
    pub name: String,
    /// Catalog type name (`data_type` on MySQL, `format_type` on Postgres).
    pub data_type: String,
}

/// Catalog facts about one table that the bootstrap needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableMetadata {
    /// Columns in ordinal order.
    pub columns: Vec<ColumnMetadata>,
    /// Primary key columns in key order.
    pub primary_key: Vec<String>,
    /// Named partitions in partition order; empty when unpartitioned.
    pub partitions: Vec<String>,
}

impl TableMetadata {
    pub fn column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn is_partitioned(&self) -> bool {
        !self.partitions.is_empty()
    }
}
