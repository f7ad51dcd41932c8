use crate::{error::ConfigError, settings::validated::ValidatedOptions};
use connectors::sql::{
    base::metadata::TableMetadata,
    mysql::data_type::MySqlColumnKind,
    postgres::data_type::is_binary_type,
};
use model::{
    core::data_type::ColumnKind,
    execution::settings::{ColumnSpec, CopySettings, SplitMode},
};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Builds the settings of one run from validated options and the catalog
/// descriptions of both tables.
///
/// Columns follow the destination's ordinal order. Every one of them must
/// exist in the source, matched case-insensitively.
pub fn resolve(
    options: &ValidatedOptions,
    source: &TableMetadata,
    destination: &TableMetadata,
) -> Result<CopySettings, ConfigError> {
    if destination.columns.is_empty() {
        return Err(ConfigError::NoColumns(options.dest_table.to_string()));
    }

    let mut columns = Vec::with_capacity(destination.columns.len());
    let mut binary_columns = BTreeSet::new();

    for (index, column) in destination.columns.iter().enumerate() {
        let source_column =
            source
                .column(&column.name)
                .ok_or_else(|| ConfigError::MissingSourceColumn {
                    table: options.source_table.to_string(),
                    column: column.name.clone(),
                })?;

        let binary = is_binary_type(&column.data_type);
        if binary {
            binary_columns.insert(index);
        }

        let mut spec = ColumnSpec::new(column.name.clone()).with_dest_type(column.data_type.clone());
        if !options.dynamic_types {
            let kind = match ColumnKind::from_mysql_type(&source_column.data_type) {
                // Blobs landing in a non-binary column are written as text.
                ColumnKind::Bytes if !binary => ColumnKind::Text,
                kind => kind,
            };
            spec = spec.with_kind(kind);
        }

        debug!(
            column = %spec.name,
            source_type = %source_column.data_type,
            dest_type = %column.data_type,
            kind = ?spec.kind,
            binary,
            "Resolved column"
        );
        columns.push(spec);
    }

    let split = if source.is_partitioned() {
        SplitMode::Partitioned
    } else {
        let key = source
            .primary_key
            .first()
            .ok_or_else(|| ConfigError::NoSplitKey(options.source_table.to_string()))?;
        SplitMode::KeyRange { key: key.clone() }
    };

    info!(
        source = %options.source_table,
        destination = %options.dest_table,
        columns = columns.len(),
        split = ?split,
        "Resolved copy settings"
    );

    Ok(CopySettings {
        source_table: options.source_table.clone(),
        dest_table: options.dest_table.clone(),
        columns,
        binary_columns,
        batch_size: options.batch_size,
        split,
        parallelism: options.parallelism,
        mixed_kinds: options.mixed_kinds,
    })
}
