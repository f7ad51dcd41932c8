use crate::error::CopyError;
use engine_processing::error::StageError;
use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info_span};

/// Runs pipeline workers and reports how each one ended.
///
/// A worker failure is pushed to the failure channel and cancels the run's
/// token, so every other worker winds down. Workers that stop because of
/// that cancellation are only recorded as interrupted.
#[derive(Clone)]
pub struct Supervisor {
    cancel: CancellationToken,
    failures: mpsc::UnboundedSender<CopyError>,
    interrupted: Arc<AtomicBool>,
}

impl Supervisor {
    pub fn new(cancel: CancellationToken) -> (Self, mpsc::UnboundedReceiver<CopyError>) {
        let (failures, rx) = mpsc::unbounded_channel();
        let supervisor = Self {
            cancel,
            failures,
            interrupted: Arc::new(AtomicBool::new(false)),
        };
        (supervisor, rx)
    }

    pub fn spawn<F>(&self, stage: &'static str, worker: usize, task: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<(), StageError>> + Send + 'static,
    {
        let supervisor = self.clone();
        let span = info_span!("worker", stage, worker);

        tokio::spawn(async move {
            match tokio::spawn(task.instrument(span)).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) if err.is_cancellation() => {
                    debug!(stage, worker, "Worker stopped on cancellation");
                    supervisor.interrupted.store(true, Ordering::SeqCst);
                }
                Ok(Err(err)) => supervisor.fail(stage, worker, CopyError::Stage(err)),
                Err(err) => supervisor.fail(stage, worker, CopyError::TaskJoin(err)),
            }
        })
    }

    /// Awaits every handle of one stage.
    pub async fn join(&self, stage: &'static str, handles: Vec<JoinHandle<()>>) {
        for (worker, handle) in handles.into_iter().enumerate() {
            if let Err(err) = handle.await {
                self.fail(stage, worker, CopyError::TaskJoin(err));
            }
        }
        debug!(stage, "Stage drained");
    }

    pub fn interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    fn fail(&self, stage: &'static str, worker: usize, err: CopyError) {
        error!(stage, worker, error = %err, "Worker failed, cancelling the copy");
        if self.failures.send(err).is_err() {
            debug!(stage, worker, "Failure channel already closed");
        }
        self.interrupted.store(true, Ordering::SeqCst);
        self.cancel.cancel();
    }
}
