use model::core::data_type::MixedKindPolicy;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PARALLELISM: usize = 1;
pub const MAX_PARALLELISM: usize = 16;
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Raw, unvalidated options as supplied on the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyOptions {
    pub source_url: String,
    pub target_url: String,
    /// `db.table`, or a bare table name in the connection's database.
    pub source_table: String,
    /// `schema.table`; defaults to the source table name.
    pub target_table: Option<String>,
    pub parallelism: usize,
    pub batch_size: usize,
    pub mixed_kinds: MixedKindPolicy,
    /// Ignore catalog kinds and decide every column from its values.
    pub dynamic_types: bool,
}

impl CopyOptions {
    pub fn new(source_url: &str, target_url: &str, source_table: &str) -> Self {
        Self {
            source_url: source_url.to_string(),
            target_url: target_url.to_string(),
            source_table: source_table.to_string(),
            target_table: None,
            parallelism: DEFAULT_PARALLELISM,
            batch_size: DEFAULT_BATCH_SIZE,
            mixed_kinds: MixedKindPolicy::default(),
            dynamic_types: false,
        }
    }
}
