use crate::{
    channel::{self, TRANSFORMED_QUEUE},
    convert,
    error::StageError,
    metrics::PipelineMetrics,
};
use async_channel::{Receiver, Sender};
use model::{
    execution::settings::CopySettings,
    records::batch::{RawBatch, TransformedBatch},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Stateless between batches: reshapes each raw batch into typed columns.
pub struct Transformer {
    worker: usize,
    settings: Arc<CopySettings>,
    raw: Receiver<RawBatch>,
    transformed: Sender<TransformedBatch>,
    cancel: CancellationToken,
    metrics: PipelineMetrics,
}

impl Transformer {
    pub fn new(
        worker: usize,
        settings: Arc<CopySettings>,
        raw: Receiver<RawBatch>,
        transformed: Sender<TransformedBatch>,
        cancel: CancellationToken,
        metrics: PipelineMetrics,
    ) -> Self {
        Self {
            worker,
            settings,
            raw,
            transformed,
            cancel,
            metrics,
        }
    }

    pub async fn run(self) -> Result<(), StageError> {
        let mut handled = 0u64;

        while let Some(batch) = channel::recv(&self.raw, &self.cancel).await? {
            let id = batch.id;
            let batch = convert::transform(&self.settings, batch)
                .map_err(|source| StageError::Conversion { batch: id, source })?;
            debug!(worker = self.worker, batch = %id, signature = ?batch.signature(), "Transformed batch");

            channel::send(&self.transformed, batch, &self.cancel, TRANSFORMED_QUEUE).await?;
            self.metrics.increment_transformed_batches(1);
            handled += 1;
        }

        info!(worker = self.worker, batches = handled, "Transformer finished.");
        Ok(())
    }
}
