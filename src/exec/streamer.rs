// src/exec/streamer.rs

//! Periodic flush of in-flight output into the store.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::exec::buffer::OutputBuffer;
use crate::store::CommandStore;
use crate::types::CommandId;

/// Flush `buffer` into the store every `interval` until `stop_rx` fires.
///
/// A stop that arrives while sleeping ends the loop without another write;
/// the executor's terminal write carries the final output. After each write
/// the stop channel is checked without blocking. Unchanged snapshots are not
/// rewritten, and failed writes are retried on the next tick.
///
/// The caller joins the returned task handle to know the streamer is done.
pub async fn stream_output(
    store: Arc<dyn CommandStore>,
    command_id: CommandId,
    buffer: OutputBuffer,
    interval: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut flushed_len = 0usize;

    loop {
        tokio::select! {
            _ = sleep(interval) => {}
            _ = &mut stop_rx => {
                debug!(command_id, "output streamer stopped while idle");
                return;
            }
        }

        let len = buffer.len();
        if len != flushed_len {
            match store.update_output(command_id, buffer.snapshot()).await {
                Ok(()) => flushed_len = len,
                Err(err) => {
                    warn!(command_id, error = %err, "failed to flush command output");
                }
            }
        }

        match stop_rx.try_recv() {
            Ok(()) | Err(TryRecvError::Closed) => {
                debug!(command_id, "output streamer stopped after flush");
                return;
            }
            Err(TryRecvError::Empty) => {}
        }
    }
}
