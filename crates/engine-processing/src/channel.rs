//! Queue operations raced against the run's cancellation token.

use crate::error::StageError;
use async_channel::{Receiver, Sender};
use tokio_util::sync::CancellationToken;

pub const TOKEN_QUEUE: &str = "token";
pub const RAW_QUEUE: &str = "raw batch";
pub const TRANSFORMED_QUEUE: &str = "transformed batch";

/// Blocks while the queue is full. Fails with `Cancelled` once shutdown is
/// requested, or `QueueClosed` when every consumer is gone.
pub async fn send<T>(
    tx: &Sender<T>,
    item: T,
    cancel: &CancellationToken,
    queue: &'static str,
) -> Result<(), StageError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StageError::Cancelled),
        sent = tx.send(item) => sent.map_err(|_| {
            if cancel.is_cancelled() {
                StageError::Cancelled
            } else {
                StageError::QueueClosed(queue)
            }
        }),
    }
}

/// `Ok(None)` once the queue is closed and drained.
pub async fn recv<T>(rx: &Receiver<T>, cancel: &CancellationToken) -> Result<Option<T>, StageError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StageError::Cancelled),
        item = rx.recv() => Ok(item.ok()),
    }
}
