// src/store/snapshot.rs

//! JSON snapshot file backing [`super::MemoryStore`] in `file` mode.
//!
//! Writes go through a [`SnapshotWriter`]: mutations hand it the serialized
//! tables and a dedicated thread puts the newest payload on disk. Payloads
//! that arrive while a write is in progress replace each other, so a burst
//! of output flushes costs one file write, and no runtime worker ever blocks
//! on the filesystem.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use anyhow::Context;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::errors::Result;

/// Read a snapshot, returning `None` when the file does not exist yet.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading snapshot {:?}", path))?;
    if contents.trim().is_empty() {
        return Ok(None);
    }
    let value = serde_json::from_str(&contents)?;
    Ok(Some(value))
}

/// Write via a temporary sibling file and a rename, so readers never observe
/// a half-written file.
fn write_payload(path: &Path, payload: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
        }
    }
    let tmp = temp_path(path);
    fs::write(&tmp, payload).with_context(|| format!("writing snapshot {:?}", tmp))?;
    fs::rename(&tmp, path).with_context(|| format!("replacing snapshot {:?}", path))?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[derive(Debug, Default)]
struct WriterState {
    pending: Option<Vec<u8>>,
    writing: bool,
    closed: bool,
}

#[derive(Debug)]
struct Shared {
    path: PathBuf,
    state: Mutex<WriterState>,
    changed: Condvar,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, WriterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, WriterState>) -> MutexGuard<'a, WriterState> {
        self.changed
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Background writer that keeps a snapshot file up to date.
///
/// Dropping the writer lets the thread finish the newest pending payload
/// and joins it, so the file is complete once the last store handle is gone.
#[derive(Debug)]
pub struct SnapshotWriter {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl SnapshotWriter {
    pub fn spawn(path: PathBuf) -> Result<Self> {
        let shared = Arc::new(Shared {
            path,
            state: Mutex::new(WriterState::default()),
            changed: Condvar::new(),
        });
        let worker = Arc::clone(&shared);
        let thread = std::thread::Builder::new()
            .name("bashq-snapshot".to_string())
            .spawn(move || run_writer(&worker))?;
        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    /// Queue `payload` as the newest file contents, replacing any payload
    /// not yet written.
    pub fn submit(&self, payload: Vec<u8>) {
        let mut state = self.shared.state();
        state.pending = Some(payload);
        self.shared.changed.notify_all();
    }

    /// Block until everything submitted so far is on disk.
    pub fn flush(&self) {
        let mut state = self.shared.state();
        while state.pending.is_some() || state.writing {
            state = self.shared.wait(state);
        }
    }
}

impl Drop for SnapshotWriter {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state();
            state.closed = true;
            self.shared.changed.notify_all();
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(path = %self.shared.path.display(), "snapshot writer thread panicked");
            }
        }
    }
}

fn run_writer(shared: &Shared) {
    loop {
        let payload = {
            let mut state = shared.state();
            while state.pending.is_none() && !state.closed {
                state = shared.wait(state);
            }
            match state.pending.take() {
                Some(payload) => {
                    state.writing = true;
                    payload
                }
                None => break,
            }
        };

        if let Err(err) = write_payload(&shared.path, &payload) {
            warn!(path = %shared.path.display(), error = %err, "failed to write command snapshot");
        } else {
            debug!(path = %shared.path.display(), bytes = payload.len(), "wrote command snapshot");
        }

        let mut state = shared.state();
        state.writing = false;
        shared.changed.notify_all();
    }
}
