use crate::{
    error::ConfigError,
    settings::{options::CopyOptions, resolve::resolve, validated::ValidatedOptions},
};
use connectors::sql::{mysql::adapter::MySqlSource, postgres::adapter::PgDestination};
use model::execution::settings::CopySettings;
use tracing::info;

/// Resolved settings plus the endpoints they were resolved against.
pub struct Bootstrap {
    pub settings: CopySettings,
    pub source: MySqlSource,
    pub destination: PgDestination,
}

/// Validates the options and reads both catalogs to build the run settings.
pub async fn bootstrap(options: &CopyOptions) -> Result<Bootstrap, ConfigError> {
    let validated = ValidatedOptions::validate(options)?;
    let source = MySqlSource::new(&options.source_url)?;
    let destination = PgDestination::new(&options.target_url)?;

    info!(
        table = %validated.source_table,
        target = %validated.dest_table,
        "Reading table catalogs"
    );
    let (source_meta, dest_meta) = tokio::try_join!(
        source.describe(&validated.source_table),
        destination.describe(&validated.dest_table),
    )?;

    let settings = resolve(&validated, &source_meta, &dest_meta)?;
    Ok(Bootstrap {
        settings,
        source,
        destination,
    })
}
