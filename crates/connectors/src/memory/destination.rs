use crate::sql::base::{
    destination::{BatchLoader, DestinationConnector},
    error::{ConnectorError, DbError},
};
use async_trait::async_trait;
use model::{
    core::value::NativeValue, execution::settings::CopySettings, records::batch::TransformedBatch,
};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicIsize, AtomicUsize, Ordering},
};
use tokio::sync::Semaphore;

#[derive(Default)]
struct State {
    rows: Mutex<Vec<Vec<NativeValue>>>,
    loads: AtomicUsize,
    open_handles: AtomicIsize,
}

/// Destination table held in memory. Optionally fails the n-th load or
/// holds every load until a permit is released on its gate.
#[derive(Clone, Default)]
pub struct MemoryDestination {
    state: Arc<State>,
    fail_at: Option<usize>,
    gate: Option<Arc<Semaphore>>,
}

impl MemoryDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows present before the copy starts.
    pub fn with_rows(self, rows: Vec<Vec<NativeValue>>) -> Self {
        if let Ok(mut stored) = self.state.rows.lock() {
            stored.extend(rows);
        }
        self
    }

    /// The `n`-th load call (1-based, across all loaders) returns an error.
    pub fn failing_at(mut self, n: usize) -> Self {
        self.fail_at = Some(n);
        self
    }

    /// Every load waits for, and consumes, one permit of `gate`.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn rows(&self) -> Vec<Vec<NativeValue>> {
        self.state
            .rows
            .lock()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    pub fn open_handles(&self) -> isize {
        self.state.open_handles.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DestinationConnector for MemoryDestination {
    fn endpoint(&self) -> String {
        "memory://destination".to_string()
    }

    async fn open_loader(
        &self,
        _settings: &CopySettings,
    ) -> Result<Box<dyn BatchLoader>, ConnectorError> {
        self.state.open_handles.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryLoader {
            destination: self.clone(),
        }))
    }

    async fn is_table_empty(&self, _settings: &CopySettings) -> Result<bool, ConnectorError> {
        Ok(self.rows().is_empty())
    }
}

struct MemoryLoader {
    destination: MemoryDestination,
}

#[async_trait]
impl BatchLoader for MemoryLoader {
    async fn load(&mut self, batch: TransformedBatch) -> Result<u64, DbError> {
        if let Some(gate) = &self.destination.gate {
            gate.acquire()
                .await
                .map_err(|e| DbError::Write(e.to_string()))?
                .forget();
        }

        let call = self.destination.state.loads.fetch_add(1, Ordering::SeqCst) + 1;
        if self.destination.fail_at == Some(call) {
            return Err(DbError::Write(format!("load {call} rejected")));
        }

        let rows = (0..batch.row_count)
            .map(|i| {
                batch
                    .row(i)
                    .ok_or_else(|| DbError::Write(format!("batch {} is ragged", batch.id)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let count = rows.len() as u64;

        self.destination
            .state
            .rows
            .lock()
            .map_err(|e| DbError::Write(e.to_string()))?
            .extend(rows);
        Ok(count)
    }

    async fn close(self: Box<Self>) -> Result<(), DbError> {
        self.destination
            .state
            .open_handles
            .fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}
