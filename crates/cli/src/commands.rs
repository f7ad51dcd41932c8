use clap::{Args, Subcommand, ValueEnum};
use engine_config::settings::options::{CopyOptions, DEFAULT_BATCH_SIZE, DEFAULT_PARALLELISM};
use model::core::data_type::MixedKindPolicy;

#[derive(Subcommand)]
pub enum Commands {
    /// Copy a MySQL table into an empty PostgreSQL table
    Copy(CopyArgs),

    /// Resolve and check a copy without moving any rows; prints the settings as JSON
    Plan(CopyArgs),

    /// Test a connection string against a given format
    TestConn {
        /// Data format: "mysql" or "pg"
        #[arg(long)]
        format: String,

        /// Connection string
        #[arg(long)]
        conn_str: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct CopyArgs {
    #[arg(long, env = "PARCOPY_SOURCE_URL", help = "MySQL connection URL")]
    pub source: String,

    #[arg(long, env = "PARCOPY_TARGET_URL", help = "PostgreSQL connection URL")]
    pub target: String,

    #[arg(long, help = "Source table as db.table")]
    pub table: String,

    #[arg(long, help = "Target table as schema.table, defaults to the source table name")]
    pub target_table: Option<String>,

    #[arg(short = 'p', long, default_value_t = DEFAULT_PARALLELISM, help = "Workers per stage, max 16")]
    pub parallel: usize,

    #[arg(short = 'f', long = "batch-size", default_value_t = DEFAULT_BATCH_SIZE, help = "Rows per batch")]
    pub batch_size: usize,

    #[arg(long, value_enum, default_value_t = MixedKinds::Reject, help = "What to do when a column mixes value kinds")]
    pub mixed_kinds: MixedKinds,

    #[arg(long, help = "Decide column kinds from the values of each batch")]
    pub dynamic_types: bool,

    #[arg(long, help = "Print the report as JSON")]
    pub json: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixedKinds {
    Reject,
    Precedence,
}

impl From<MixedKinds> for MixedKindPolicy {
    fn from(value: MixedKinds) -> Self {
        match value {
            MixedKinds::Reject => MixedKindPolicy::Reject,
            MixedKinds::Precedence => MixedKindPolicy::Precedence,
        }
    }
}

impl CopyArgs {
    pub fn options(&self) -> CopyOptions {
        CopyOptions {
            source_url: self.source.clone(),
            target_url: self.target.clone(),
            source_table: self.table.clone(),
            target_table: self.target_table.clone(),
            parallelism: self.parallel,
            batch_size: self.batch_size,
            mixed_kinds: self.mixed_kinds.into(),
            dynamic_types: self.dynamic_types,
        }
    }
}
