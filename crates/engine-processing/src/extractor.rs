use crate::{
    channel::{self, RAW_QUEUE},
    error::StageError,
    metrics::PipelineMetrics,
};
use async_channel::{Receiver, Sender};
use connectors::sql::base::source::{RowReader, SourceConnector};
use futures::StreamExt;
use model::{
    core::{identifiers::BatchId, value::NativeValue},
    execution::settings::CopySettings,
    records::{batch::RawBatch, token::WorkToken},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Pulls tokens, streams their rows and emits fixed-size raw batches.
///
/// Rows accumulate in a private buffer that may span several tokens; the
/// remainder is flushed as a short batch once the token queue is drained.
pub struct Extractor {
    worker: usize,
    settings: Arc<CopySettings>,
    source: Arc<dyn SourceConnector>,
    tokens: Receiver<WorkToken>,
    batches: Sender<RawBatch>,
    cancel: CancellationToken,
    metrics: PipelineMetrics,
    buffer: Vec<NativeValue>,
    next_seq: u64,
}

impl Extractor {
    pub fn new(
        worker: usize,
        settings: Arc<CopySettings>,
        source: Arc<dyn SourceConnector>,
        tokens: Receiver<WorkToken>,
        batches: Sender<RawBatch>,
        cancel: CancellationToken,
        metrics: PipelineMetrics,
    ) -> Self {
        let capacity = settings.batch_size * settings.column_count();
        Self {
            worker,
            settings,
            source,
            tokens,
            batches,
            cancel,
            metrics,
            buffer: Vec::with_capacity(capacity),
            next_seq: 0,
        }
    }

    pub async fn run(mut self) -> Result<(), StageError> {
        let mut reader = self
            .source
            .open_reader(&self.settings)
            .await
            .map_err(|source| StageError::Connection {
                endpoint: self.source.endpoint(),
                source,
            })?;

        let result = self.drain(&mut *reader).await;

        if let Err(error) = reader.close().await {
            warn!(worker = self.worker, %error, "Failed to close source connection");
        }

        result?;
        info!(worker = self.worker, batches = self.next_seq, "Extractor finished.");
        Ok(())
    }

    async fn drain(&mut self, reader: &mut dyn RowReader) -> Result<(), StageError> {
        while let Some(token) = channel::recv(&self.tokens, &self.cancel).await? {
            let rows = self.extract_token(reader, &token).await?;
            debug!(worker = self.worker, token = %token, rows, "Extracted token");
        }

        if !self.buffer.is_empty() {
            self.flush().await?;
        }
        Ok(())
    }

    async fn extract_token(
        &mut self,
        reader: &mut dyn RowReader,
        token: &WorkToken,
    ) -> Result<u64, StageError> {
        let width = self.settings.column_count();
        let full = self.settings.batch_size * width;
        let mut rows = reader.rows(token);
        let mut count = 0;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(StageError::Cancelled),
                next = rows.next() => next,
            };
            let Some(row) = next else { break };

            let row = row.map_err(|e| StageError::Extraction {
                token: token.to_string(),
                source: Box::new(e),
            })?;
            if row.len() != width {
                return Err(StageError::Extraction {
                    token: token.to_string(),
                    source: format!("row has {} columns, expected {width}", row.len()).into(),
                });
            }

            self.buffer.extend(row);
            count += 1;
            if self.buffer.len() == full {
                self.flush().await?;
            }
        }

        Ok(count)
    }

    async fn flush(&mut self) -> Result<(), StageError> {
        let width = self.settings.column_count();
        let capacity = self.settings.batch_size * width;
        let values = std::mem::replace(&mut self.buffer, Vec::with_capacity(capacity));
        let batch = RawBatch::new(BatchId::new(self.worker, self.next_seq), width, values);
        let rows = batch.row_count() as u64;
        self.next_seq += 1;

        channel::send(&self.batches, batch, &self.cancel, RAW_QUEUE).await?;
        self.metrics.increment_rows_extracted(rows);
        self.metrics.increment_raw_batches(1);
        Ok(())
    }
}
