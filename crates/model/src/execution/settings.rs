use crate::core::{
    data_type::{ColumnKind, MixedKindPolicy},
    identifiers::TableRef,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A destination column and what is known about it before the copy starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    /// Kind declared by the source catalog. `None` leaves the decision to
    /// the per-batch value scan.
    pub kind: Option<ColumnKind>,
    /// Destination SQL type used to cast the bound array, e.g. `numeric(10,2)`.
    pub dest_type: Option<String>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            dest_type: None,
        }
    }

    pub fn with_kind(mut self, kind: ColumnKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_dest_type(mut self, dest_type: impl Into<String>) -> Self {
        self.dest_type = Some(dest_type.into());
        self
    }
}

/// How the source table is divided into work tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SplitMode {
    /// Walk the ordered key column in steps of one batch.
    KeyRange { key: String },
    /// One token per physical partition.
    Partitioned,
}

/// Fully resolved, immutable settings for one copy run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopySettings {
    pub source_table: TableRef,
    pub dest_table: TableRef,
    pub columns: Vec<ColumnSpec>,
    /// Zero-based ordinals of columns that carry raw bytes.
    pub binary_columns: BTreeSet<usize>,
    pub batch_size: usize,
    pub split: SplitMode,
    pub parallelism: usize,
    pub mixed_kinds: MixedKindPolicy,
}

impl CopySettings {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn is_binary(&self, index: usize) -> bool {
        self.binary_columns.contains(&index)
    }
}
