// src/exec/buffer.rs

//! Shared output buffer filled by the pipe readers and sampled by the
//! output streamer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::types::CommandId;

#[derive(Debug, Default)]
struct BufferState {
    bytes: Vec<u8>,
    truncated: bool,
}

/// Combined stdout/stderr of one child process.
///
/// Both pipes append into the same buffer in arrival order. Once `limit`
/// bytes are stored further output is drained and dropped.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    state: Arc<Mutex<BufferState>>,
    limit: Option<usize>,
}

impl OutputBuffer {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            state: Arc::new(Mutex::new(BufferState::default())),
            limit,
        }
    }

    fn state(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a chunk. Returns `true` if this call was the first one to hit
    /// the limit.
    pub fn append(&self, chunk: &[u8]) -> bool {
        let mut state = self.state();
        let to_copy = match self.limit {
            Some(limit) => limit.saturating_sub(state.bytes.len()).min(chunk.len()),
            None => chunk.len(),
        };
        state.bytes.extend_from_slice(&chunk[..to_copy]);
        if to_copy < chunk.len() && !state.truncated {
            state.truncated = true;
            return true;
        }
        false
    }

    /// Current contents as text; invalid UTF-8 is replaced.
    pub fn snapshot(&self) -> String {
        String::from_utf8_lossy(&self.state().bytes).into_owned()
    }

    pub fn len(&self) -> usize {
        self.state().bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_truncated(&self) -> bool {
        self.state().truncated
    }
}

/// Spawn a task copying `reader` into `buffer` until EOF.
pub fn spawn_pump<R>(command_id: CommandId, stream: &'static str, reader: R, buffer: OutputBuffer) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(err) = pump(command_id, stream, reader, &buffer).await {
            warn!(command_id, stream, error = %err, "error reading command output");
        }
    })
}

async fn pump<R: AsyncRead + Unpin>(
    command_id: CommandId,
    stream: &'static str,
    mut reader: R,
    buffer: &OutputBuffer,
) -> std::io::Result<()> {
    let mut chunk = [0u8; 4096];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        if buffer.append(&chunk[..n]) {
            warn!(command_id, stream, "output limit reached; discarding further output");
        }
    }
    debug!(command_id, stream, "output stream closed");
    Ok(())
}
