use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    tokens: AtomicU64,
    rows_extracted: AtomicU64,
    raw_batches: AtomicU64,
    transformed_batches: AtomicU64,
    rows_loaded: AtomicU64,
    batches_loaded: AtomicU64,
}

/// Lock-free counters shared by every stage of one run.
#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub tokens: u64,
    pub rows_extracted: u64,
    pub raw_batches: u64,
    pub transformed_batches: u64,
    pub rows_loaded: u64,
    pub batches_loaded: u64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        PipelineMetrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_tokens(&self, count: u64) {
        self.inner.tokens.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_rows_extracted(&self, count: u64) {
        self.inner.rows_extracted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_raw_batches(&self, count: u64) {
        self.inner.raw_batches.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_transformed_batches(&self, count: u64) {
        self.inner
            .transformed_batches
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_rows_loaded(&self, count: u64) {
        self.inner.rows_loaded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_batches_loaded(&self, count: u64) {
        self.inner.batches_loaded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tokens: self.inner.tokens.load(Ordering::Relaxed),
            rows_extracted: self.inner.rows_extracted.load(Ordering::Relaxed),
            raw_batches: self.inner.raw_batches.load(Ordering::Relaxed),
            transformed_batches: self.inner.transformed_batches.load(Ordering::Relaxed),
            rows_loaded: self.inner.rows_loaded.load(Ordering::Relaxed),
            batches_loaded: self.inner.batches_loaded.load(Ordering::Relaxed),
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
