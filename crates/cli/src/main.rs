use crate::{
    commands::{Commands, CopyArgs},
    conn::ConnectionKind,
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use engine_config::bootstrap::{Bootstrap, bootstrap};
use engine_runtime::execution::{executor, job::CopyJob};
use std::{str::FromStr, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod conn;
mod error;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "parcopy",
    version,
    about = "Parallel table copy from MySQL to PostgreSQL"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    let code = match run(cli.command, &shutdown).await {
        Ok(()) => ExitCode::Success,
        Err(err) => {
            let code = if shutdown.is_shutdown_requested() {
                ExitCode::ShutdownRequested
            } else {
                err.exit_code()
            };
            match code {
                ExitCode::ShutdownRequested => warn!(%err, "Stopped before completion"),
                _ => error!(%err, "parcopy failed"),
            }
            code
        }
    };

    std::process::exit(code.as_i32());
}

async fn run(command: Commands, shutdown: &ShutdownCoordinator) -> Result<(), CliError> {
    match command {
        Commands::Copy(args) => {
            let job = prepare(&args, shutdown).await?;
            let report = executor::run(job, shutdown.cancel_token()).await?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{report}");
            }
        }
        Commands::Plan(args) => {
            let job = prepare(&args, shutdown).await?;
            executor::preflight(&job).await?;
            info!(table = %job.settings.dest_table, "Destination is empty, copy can proceed");
            println!("{}", serde_json::to_string_pretty(job.settings.as_ref())?);
        }
        Commands::TestConn { format, conn_str } => {
            let kind = ConnectionKind::from_str(&format)
                .map_err(|_| CliError::InvalidConnectionFormat(format))?;
            kind.pinger(conn_str).ping().await?;
        }
    }

    Ok(())
}

/// Bootstraps a job from the command-line arguments. Catalog reads are
/// abandoned when shutdown is requested.
async fn prepare(args: &CopyArgs, shutdown: &ShutdownCoordinator) -> Result<CopyJob, CliError> {
    let cancel = shutdown.cancel_token();
    let options = args.options();

    let Bootstrap {
        settings,
        source,
        destination,
    } = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(CliError::ShutdownRequested),
        bootstrapped = bootstrap(&options) => bootstrapped?,
    };

    Ok(CopyJob::new(settings, Arc::new(source), Arc::new(destination)))
}
