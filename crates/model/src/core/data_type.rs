use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed column bucket a value ends up in before loading.
///
/// Variants are declared in ascending precedence: when a column observed
/// values of several kinds and the mixed-kind policy allows it, the
/// greatest kind wins, so float outranks integer and text ranks last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Timestamp,
    Bytes,
    Integer,
    Float,
}

impl ColumnKind {
    pub const ALL: [ColumnKind; 5] = [
        ColumnKind::Text,
        ColumnKind::Timestamp,
        ColumnKind::Bytes,
        ColumnKind::Integer,
        ColumnKind::Float,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Text => "text",
            ColumnKind::Timestamp => "timestamp",
            ColumnKind::Bytes => "bytes",
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "float",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy applied when a column without a declared kind observes
/// values of more than one kind inside a single batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixedKindPolicy {
    /// Fail the batch with a conversion error.
    #[default]
    Reject,
    /// Pick the highest-precedence kind and coerce every value into it.
    Precedence,
}
