use crate::{
    error::ConfigError,
    settings::options::{CopyOptions, MAX_PARALLELISM},
};
use model::core::{data_type::MixedKindPolicy, identifiers::TableRef};
use tracing::warn;

/// Options that passed validation; table names are parsed and numeric
/// limits applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOptions {
    pub source_table: TableRef,
    pub dest_table: TableRef,
    pub parallelism: usize,
    pub batch_size: usize,
    pub mixed_kinds: MixedKindPolicy,
    pub dynamic_types: bool,
}

impl ValidatedOptions {
    pub fn validate(options: &CopyOptions) -> Result<Self, ConfigError> {
        if options.source_url.trim().is_empty() {
            return Err(ConfigError::InvalidOption("source URL is empty".into()));
        }
        if options.target_url.trim().is_empty() {
            return Err(ConfigError::InvalidOption("target URL is empty".into()));
        }

        let source_table = TableRef::parse(&options.source_table)
            .ok_or_else(|| ConfigError::InvalidTable(options.source_table.clone()))?;
        let dest_table = match &options.target_table {
            Some(name) => {
                TableRef::parse(name).ok_or_else(|| ConfigError::InvalidTable(name.clone()))?
            }
            None => TableRef::new(None, source_table.name()),
        };

        let parallelism = options.parallelism.clamp(1, MAX_PARALLELISM);
        if parallelism != options.parallelism {
            warn!(
                requested = options.parallelism,
                parallelism, "Parallelism out of range, clamped"
            );
        }

        let batch_size = options.batch_size.max(1);
        if batch_size != options.batch_size {
            warn!(requested = options.batch_size, batch_size, "Batch size raised to 1");
        }

        Ok(Self {
            source_table,
            dest_table,
            parallelism,
            batch_size,
            mixed_kinds: options.mixed_kinds,
            dynamic_types: options.dynamic_types,
        })
    }
}
