use engine_processing::metrics::MetricsSnapshot;
use serde::{Serialize, Serializer};
use std::{fmt, time::Duration};

/// Outcome of a completed copy run.
#[derive(Debug, Clone, Serialize)]
pub struct CopyReport {
    pub source: String,
    pub destination: String,
    pub tokens: u64,
    pub rows_extracted: u64,
    pub raw_batches: u64,
    pub transformed_batches: u64,
    pub rows_loaded: u64,
    pub batches_loaded: u64,
    #[serde(rename = "elapsed_secs", serialize_with = "as_secs")]
    pub elapsed: Duration,
}

impl CopyReport {
    pub fn new(
        source: String,
        destination: String,
        metrics: MetricsSnapshot,
        elapsed: Duration,
    ) -> Self {
        Self {
            source,
            destination,
            tokens: metrics.tokens,
            rows_extracted: metrics.rows_extracted,
            raw_batches: metrics.raw_batches,
            transformed_batches: metrics.transformed_batches,
            rows_loaded: metrics.rows_loaded,
            batches_loaded: metrics.batches_loaded,
            elapsed,
        }
    }
}

impl fmt::Display for CopyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Copy data from [{}] to [{}] finish, time : {:.2}s",
            self.source,
            self.destination,
            self.elapsed.as_secs_f64()
        )
    }
}

fn as_secs<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64())
}
