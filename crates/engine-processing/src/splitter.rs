use crate::{
    channel::{self, TOKEN_QUEUE},
    error::StageError,
    metrics::PipelineMetrics,
};
use async_channel::Sender;
use connectors::sql::base::source::{BoundaryProbe, SourceConnector};
use model::{
    core::value::NativeValue,
    execution::settings::{CopySettings, SplitMode},
    records::token::{KeyRange, WorkToken},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Produces the exhaustive, non-overlapping token sequence for the source
/// table and pushes it to the token queue.
pub struct RangeSplitter {
    settings: Arc<CopySettings>,
    source: Arc<dyn SourceConnector>,
    tokens: Sender<WorkToken>,
    cancel: CancellationToken,
    metrics: PipelineMetrics,
}

impl RangeSplitter {
    pub fn new(
        settings: Arc<CopySettings>,
        source: Arc<dyn SourceConnector>,
        tokens: Sender<WorkToken>,
        cancel: CancellationToken,
        metrics: PipelineMetrics,
    ) -> Self {
        Self {
            settings,
            source,
            tokens,
            cancel,
            metrics,
        }
    }

    pub async fn run(self) -> Result<(), StageError> {
        let mut probe = self
            .source
            .open_probe(&self.settings)
            .await
            .map_err(|source| StageError::Connection {
                endpoint: self.source.endpoint(),
                source,
            })?;

        let result = match &self.settings.split {
            SplitMode::KeyRange { key } => {
                info!(key = %key, batch_size = self.settings.batch_size, "Splitting by key range");
                self.split_ranges(key, &mut *probe).await
            }
            SplitMode::Partitioned => {
                info!("Splitting by partition");
                self.split_partitions(&mut *probe).await
            }
        };

        if let Err(error) = probe.close().await {
            warn!(%error, "Failed to close boundary probe connection");
        }

        let tokens = result?;
        info!(tokens, "Splitting finished.");
        Ok(())
    }

    /// Each probe skips `batch_size - 1` keys past the previous boundary,
    /// so every bounded range covers exactly one batch worth of keys. The
    /// first probe that finds nothing closes the sequence with an open end.
    /// A NULL boundary (a MySQL zero date reads as one) cannot bound a range.
    async fn split_ranges(
        &self,
        key: &str,
        probe: &mut dyn BoundaryProbe,
    ) -> Result<u64, StageError> {
        let skip = self.settings.batch_size.saturating_sub(1);
        let mut begin: Option<NativeValue> = None;
        let mut emitted = 0;

        loop {
            let boundary = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(StageError::Cancelled),
                boundary = probe.next_boundary(begin.as_ref(), skip) => {
                    boundary.map_err(StageError::Probe)?
                }
            };

            if let Some(NativeValue::Null) = boundary {
                return Err(StageError::NullBoundary {
                    key: key.to_string(),
                    after: begin
                        .as_ref()
                        .map_or_else(|| "the first key".to_string(), |b| b.to_string()),
                });
            }

            let range = KeyRange {
                begin: begin.take(),
                end: boundary.clone(),
            };
            self.emit(WorkToken::Range(range)).await?;
            emitted += 1;

            match boundary {
                Some(end) => begin = Some(end),
                None => return Ok(emitted),
            }
        }
    }

    async fn split_partitions(&self, probe: &mut dyn BoundaryProbe) -> Result<u64, StageError> {
        let partitions = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(StageError::Cancelled),
            partitions = probe.partitions() => partitions.map_err(StageError::Probe)?,
        };

        let mut emitted = 0;
        for name in partitions {
            self.emit(WorkToken::Partition(name)).await?;
            emitted += 1;
        }
        Ok(emitted)
    }

    async fn emit(&self, token: WorkToken) -> Result<(), StageError> {
        debug!(token = %token, "Emitting token");
        channel::send(&self.tokens, token, &self.cancel, TOKEN_QUEUE).await?;
        self.metrics.increment_tokens(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::memory::source::MemorySource;
    use model::{
        core::{data_type::MixedKindPolicy, identifiers::TableRef},
        execution::settings::ColumnSpec,
    };
    use tracing_test::traced_test;

    fn settings(batch_size: usize, split: SplitMode) -> Arc<CopySettings> {
        Arc::new(CopySettings {
            source_table: TableRef::new(None, "t"),
            dest_table: TableRef::new(None, "t"),
            columns: vec![ColumnSpec::new("id")],
            binary_columns: Default::default(),
            batch_size,
            split,
            parallelism: 1,
            mixed_kinds: MixedKindPolicy::Reject,
        })
    }

    fn keyed(batch_size: usize) -> Arc<CopySettings> {
        settings(batch_size, SplitMode::KeyRange { key: "id".into() })
    }

    fn rows(keys: impl IntoIterator<Item = i64>) -> Vec<Vec<NativeValue>> {
        keys.into_iter().map(|k| vec![NativeValue::Int(k)]).collect()
    }

    async fn split(source: MemorySource, settings: Arc<CopySettings>) -> Vec<WorkToken> {
        let (tx, rx) = async_channel::unbounded();
        let splitter = RangeSplitter::new(
            settings,
            Arc::new(source.clone()),
            tx,
            CancellationToken::new(),
            PipelineMetrics::new(),
        );
        splitter.run().await.unwrap();
        assert_eq!(source.open_handles(), 0);

        let mut tokens = Vec::new();
        while let Ok(token) = rx.try_recv() {
            tokens.push(token);
        }
        tokens
    }

    fn range(begin: Option<i64>, end: Option<i64>) -> WorkToken {
        WorkToken::Range(KeyRange {
            begin: begin.map(NativeValue::Int),
            end: end.map(NativeValue::Int),
        })
    }

    #[tokio::test]
    #[traced_test]
    async fn ranges_cover_exactly_one_batch_each() {
        let source = MemorySource::new(&["id"], rows(1..=10_000));
        let tokens = split(source, keyed(1000)).await;

        assert_eq!(tokens.len(), 11);
        assert_eq!(tokens[0], range(None, Some(1000)));
        assert_eq!(tokens[1], range(Some(1000), Some(2000)));
        assert_eq!(tokens[9], range(Some(9000), Some(10_000)));
        assert_eq!(tokens[10], range(Some(10_000), None));
        assert!(logs_contain("Splitting finished."));
    }

    #[tokio::test]
    async fn ranges_are_disjoint_and_exhaustive() {
        let keys = [3, 7, 8, 15, 16, 23, 42, 99, 100, 101];
        let source = MemorySource::new(&["id"], rows(keys));
        let tokens = split(source, keyed(3)).await;

        for key in keys {
            let owners = tokens
                .iter()
                .filter(|t| match t {
                    WorkToken::Range(r) => r.contains(&NativeValue::Int(key)),
                    WorkToken::Partition(_) => false,
                })
                .count();
            assert_eq!(owners, 1, "key {key} covered {owners} times");
        }
        assert!(matches!(&tokens[0], WorkToken::Range(r) if r.begin.is_none()));
        assert!(matches!(tokens.last(), Some(WorkToken::Range(r)) if r.end.is_none()));
    }

    #[tokio::test]
    async fn undersized_table_yields_single_full_range() {
        let source = MemorySource::new(&["id"], rows(1..=5));
        let tokens = split(source, keyed(100)).await;
        assert_eq!(tokens, vec![WorkToken::Range(KeyRange::full())]);
    }

    #[tokio::test]
    async fn empty_table_yields_single_full_range() {
        let source = MemorySource::new(&["id"], Vec::new());
        let tokens = split(source, keyed(10)).await;
        assert_eq!(tokens, vec![WorkToken::Range(KeyRange::full())]);
    }

    #[tokio::test]
    async fn null_boundary_stops_the_split() {
        let source = MemorySource::new(&["id"], vec![vec![NativeValue::Null]]);
        let (tx, rx) = async_channel::unbounded();
        let splitter = RangeSplitter::new(
            keyed(1),
            Arc::new(source.clone()),
            tx,
            CancellationToken::new(),
            PipelineMetrics::new(),
        );

        let err = splitter.run().await.unwrap_err();
        assert!(matches!(err, StageError::NullBoundary { ref key, .. } if key == "id"));
        assert!(rx.try_recv().is_err());
        assert_eq!(source.open_handles(), 0);
    }

    #[tokio::test]
    async fn partitions_are_emitted_once_each() {
        let source = MemorySource::partitioned(
            &["id"],
            vec![("p0", rows(1..=3)), ("p1", rows(4..=6)), ("p2", Vec::new())],
        );
        let tokens = split(source, settings(2, SplitMode::Partitioned)).await;
        assert_eq!(
            tokens,
            vec![
                WorkToken::Partition("p0".into()),
                WorkToken::Partition("p1".into()),
                WorkToken::Partition("p2".into()),
            ]
        );
    }

    #[tokio::test]
    async fn cancelled_splitter_releases_probe() {
        let source = MemorySource::new(&["id"], rows(1..=100));
        let (tx, _rx) = async_channel::bounded(1);
        let cancel = CancellationToken::new();
        let splitter = RangeSplitter::new(
            keyed(1),
            Arc::new(source.clone()),
            tx,
            cancel.clone(),
            PipelineMetrics::new(),
        );

        let handle = tokio::spawn(splitter.run());
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        cancel.cancel();

        assert!(matches!(handle.await.unwrap(), Err(StageError::Cancelled)));
        assert_eq!(source.open_handles(), 0);
    }
}
