use crate::{
    error::CopyError,
    execution::{job::CopyJob, report::CopyReport, workers::Supervisor},
};
use engine_processing::{
    error::StageError, extractor::Extractor, loader::Loader, metrics::PipelineMetrics,
    splitter::RangeSplitter, transformer::Transformer,
};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub async fn run(job: CopyJob, cancel: CancellationToken) -> Result<CopyReport, CopyError> {
    CopyExecutor::new(job).run(cancel).await
}

/// Fails unless the destination table holds no rows.
pub async fn preflight(job: &CopyJob) -> Result<(), CopyError> {
    let empty = job
        .destination
        .is_table_empty(&job.settings)
        .await
        .map_err(CopyError::Preflight)?;

    if !empty {
        return Err(CopyError::DestinationNotEmpty {
            table: job.settings.dest_table.to_string(),
        });
    }
    Ok(())
}

pub struct CopyExecutor {
    job: CopyJob,
    metrics: PipelineMetrics,
}

impl CopyExecutor {
    pub fn new(job: CopyJob) -> Self {
        Self {
            job,
            metrics: PipelineMetrics::new(),
        }
    }

    /// Live counters of the run, readable while it is in flight.
    pub fn metrics(&self) -> PipelineMetrics {
        self.metrics.clone()
    }

    /// Runs the whole pipeline to completion.
    ///
    /// Stages are drained in order: splitter, extractors, transformers,
    /// loaders. Each queue is closed only once every producer feeding it has
    /// exited, so no worker is left behind even when the run fails.
    pub async fn run(self, cancel: CancellationToken) -> Result<CopyReport, CopyError> {
        let start = Instant::now();
        preflight(&self.job).await?;

        let CopyJob {
            settings,
            source,
            destination,
        } = self.job;
        let metrics = self.metrics;
        let workers = settings.parallelism.max(1);

        info!(
            source = %source.endpoint(),
            destination = %destination.endpoint(),
            table = %settings.source_table,
            parallelism = workers,
            batch_size = settings.batch_size,
            "Starting copy"
        );

        let cancel = cancel.child_token();
        let (supervisor, mut failures) = Supervisor::new(cancel.clone());

        let (token_tx, token_rx) = async_channel::bounded(workers);
        let (raw_tx, raw_rx) = async_channel::bounded(workers);
        let (transformed_tx, transformed_rx) = async_channel::bounded(workers);

        let splitter = supervisor.spawn(
            "splitter",
            0,
            RangeSplitter::new(
                settings.clone(),
                source.clone(),
                token_tx.clone(),
                cancel.clone(),
                metrics.clone(),
            )
            .run(),
        );

        let extractors = (0..workers)
            .map(|worker| {
                let extractor = Extractor::new(
                    worker,
                    settings.clone(),
                    source.clone(),
                    token_rx.clone(),
                    raw_tx.clone(),
                    cancel.clone(),
                    metrics.clone(),
                );
                supervisor.spawn("extractor", worker, extractor.run())
            })
            .collect::<Vec<_>>();

        let transformers = (0..workers)
            .map(|worker| {
                let transformer = Transformer::new(
                    worker,
                    settings.clone(),
                    raw_rx.clone(),
                    transformed_tx.clone(),
                    cancel.clone(),
                    metrics.clone(),
                );
                supervisor.spawn("transformer", worker, transformer.run())
            })
            .collect::<Vec<_>>();

        let loaders = (0..workers)
            .map(|worker| {
                let loader = Loader::new(
                    worker,
                    settings.clone(),
                    destination.clone(),
                    transformed_rx.clone(),
                    cancel.clone(),
                    metrics.clone(),
                );
                supervisor.spawn("loader", worker, loader.run())
            })
            .collect::<Vec<_>>();

        // Only workers hold receivers, so a producer whose consumers are all
        // gone gets an error instead of blocking forever.
        drop((token_rx, raw_rx, transformed_rx));

        supervisor.join("splitter", vec![splitter]).await;
        token_tx.close();
        supervisor.join("extractor", extractors).await;
        raw_tx.close();
        supervisor.join("transformer", transformers).await;
        transformed_tx.close();
        supervisor.join("loader", loaders).await;

        let mut reported = Vec::new();
        while let Ok(failure) = failures.try_recv() {
            reported.push(failure);
        }
        let duration_ms = start.elapsed().as_millis() as u64;
        if let Some(failure) = root_cause(reported) {
            error!(
                error = %failure,
                rows_loaded = metrics.snapshot().rows_loaded,
                duration_ms,
                "Copy failed."
            );
            return Err(failure);
        }
        if supervisor.interrupted() {
            warn!(
                rows_loaded = metrics.snapshot().rows_loaded,
                duration_ms,
                "Copy interrupted; the destination holds a partial copy"
            );
            return Err(CopyError::Cancelled);
        }

        let report = CopyReport::new(
            source.endpoint(),
            destination.endpoint(),
            metrics.snapshot(),
            start.elapsed(),
        );
        info!(
            tokens = report.tokens,
            rows = report.rows_loaded,
            batches = report.batches_loaded,
            duration_ms = report.elapsed.as_millis() as u64,
            "Copy finished."
        );
        Ok(report)
    }
}

/// A closed queue only means the workers on its far side already stopped,
/// so the error that stopped them is reported in its place.
fn root_cause(failures: Vec<CopyError>) -> Option<CopyError> {
    let (secondary, primary): (Vec<_>, Vec<_>) = failures
        .into_iter()
        .partition(|f| matches!(f, CopyError::Stage(StageError::QueueClosed(_))));
    primary.into_iter().chain(secondary).next()
}
