use crate::{channel, error::StageError, metrics::PipelineMetrics};
use async_channel::Receiver;
use connectors::sql::base::destination::{BatchLoader, DestinationConnector};
use model::{execution::settings::CopySettings, records::batch::TransformedBatch};
use std::{sync::Arc, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Writes transformed batches to the destination over its own connection.
/// Every batch is committed on its own. Cancellation is observed between
/// batches; a batch already handed to the destination runs to completion.
pub struct Loader {
    worker: usize,
    settings: Arc<CopySettings>,
    destination: Arc<dyn DestinationConnector>,
    batches: Receiver<TransformedBatch>,
    cancel: CancellationToken,
    metrics: PipelineMetrics,
}

impl Loader {
    pub fn new(
        worker: usize,
        settings: Arc<CopySettings>,
        destination: Arc<dyn DestinationConnector>,
        batches: Receiver<TransformedBatch>,
        cancel: CancellationToken,
        metrics: PipelineMetrics,
    ) -> Self {
        Self {
            worker,
            settings,
            destination,
            batches,
            cancel,
            metrics,
        }
    }

    pub async fn run(self) -> Result<(), StageError> {
        let mut loader = self
            .destination
            .open_loader(&self.settings)
            .await
            .map_err(|source| StageError::Connection {
                endpoint: self.destination.endpoint(),
                source,
            })?;

        let result = self.drain(&mut *loader).await;

        if let Err(error) = loader.close().await {
            warn!(worker = self.worker, %error, "Failed to close destination connection");
        }

        let rows = result?;
        info!(worker = self.worker, rows, "Loader finished.");
        Ok(())
    }

    async fn drain(&self, loader: &mut dyn BatchLoader) -> Result<u64, StageError> {
        let mut total = 0;

        while let Some(batch) = channel::recv(&self.batches, &self.cancel).await? {
            let id = batch.id;
            let start = Instant::now();

            let rows = loader
                .load(batch)
                .await
                .map_err(|source| StageError::Load { batch: id, source })?;

            let elapsed = start.elapsed().as_secs_f64();
            let rows_per_sec = if elapsed > 0.0 { rows as f64 / elapsed } else { 0.0 };
            debug!(worker = self.worker, batch = %id, rows, rows_per_sec = format!("{rows_per_sec:.0}"), "Loaded batch");

            self.metrics.increment_rows_loaded(rows);
            self.metrics.increment_batches_loaded(1);
            total += rows;
        }

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::{memory::destination::MemoryDestination, sql::base::error::DbError};
    use model::{
        core::{
            data_type::MixedKindPolicy,
            identifiers::{BatchId, TableRef},
            value::NativeValue,
        },
        execution::settings::{ColumnSpec, SplitMode},
        records::batch::ColumnArray,
    };
    use std::time::Duration;
    use tokio::sync::Semaphore;
    use tracing_test::traced_test;

    fn settings() -> Arc<CopySettings> {
        Arc::new(CopySettings {
            source_table: TableRef::new(None, "t"),
            dest_table: TableRef::new(None, "t"),
            columns: vec![ColumnSpec::new("id")],
            binary_columns: Default::default(),
            batch_size: 2,
            split: SplitMode::KeyRange { key: "id".into() },
            parallelism: 1,
            mixed_kinds: MixedKindPolicy::Reject,
        })
    }

    fn batch(seq: u64, ids: &[i64]) -> TransformedBatch {
        TransformedBatch {
            id: BatchId::new(0, seq),
            row_count: ids.len(),
            columns: vec![ColumnArray::Integer(ids.iter().map(|i| Some(*i)).collect())],
        }
    }

    fn loader(
        destination: &MemoryDestination,
        batches: Receiver<TransformedBatch>,
        cancel: CancellationToken,
        metrics: PipelineMetrics,
    ) -> Loader {
        Loader::new(
            0,
            settings(),
            Arc::new(destination.clone()),
            batches,
            cancel,
            metrics,
        )
    }

    #[tokio::test]
    #[traced_test]
    async fn loads_every_batch_and_counts_rows() {
        let destination = MemoryDestination::new();
        let (tx, rx) = async_channel::unbounded();
        tx.send(batch(0, &[1, 2])).await.unwrap();
        tx.send(batch(1, &[3])).await.unwrap();
        tx.close();

        let metrics = PipelineMetrics::new();
        loader(&destination, rx, CancellationToken::new(), metrics.clone())
            .run()
            .await
            .unwrap();

        assert_eq!(destination.rows().len(), 3);
        assert_eq!(metrics.snapshot().rows_loaded, 3);
        assert_eq!(metrics.snapshot().batches_loaded, 2);
        assert_eq!(destination.open_handles(), 0);
        assert!(logs_contain("Loader finished."));
    }

    #[tokio::test]
    async fn rejected_batch_is_reported_with_its_id() {
        let destination = MemoryDestination::new().failing_at(2);
        let (tx, rx) = async_channel::unbounded();
        tx.send(batch(0, &[1])).await.unwrap();
        tx.send(batch(1, &[2])).await.unwrap();
        tx.send(batch(2, &[3])).await.unwrap();
        tx.close();

        let result = loader(&destination, rx, CancellationToken::new(), PipelineMetrics::new())
            .run()
            .await;

        match result {
            Err(StageError::Load { batch, source }) => {
                assert_eq!(batch, BatchId::new(0, 1));
                assert!(matches!(source, DbError::Write(_)));
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(destination.rows(), vec![vec![NativeValue::Int(1)]]);
        assert_eq!(destination.open_handles(), 0);
    }

    #[tokio::test]
    async fn cancellation_lets_the_current_load_finish() {
        let gate = Arc::new(Semaphore::new(0));
        let destination = MemoryDestination::new().gated(gate.clone());
        let (tx, rx) = async_channel::unbounded();
        tx.send(batch(0, &[1])).await.unwrap();
        tx.send(batch(1, &[2])).await.unwrap();

        let cancel = CancellationToken::new();
        let metrics = PipelineMetrics::new();
        let handle = tokio::spawn(loader(&destination, rx, cancel.clone(), metrics.clone()).run());
        tokio::time::sleep(Duration::from_millis(20)).await;

        cancel.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished());

        gate.add_permits(5);
        assert!(matches!(handle.await.unwrap(), Err(StageError::Cancelled)));
        assert_eq!(destination.rows(), vec![vec![NativeValue::Int(1)]]);
        assert_eq!(metrics.snapshot().rows_loaded, 1);
        assert_eq!(destination.open_handles(), 0);
    }
}
