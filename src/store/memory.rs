// src/store/memory.rs

use std::collections::BTreeMap;
use std::future::ready;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::snapshot::{self, SnapshotWriter};
use super::{Admission, CommandStore, Promotion, StoreFuture};
use crate::errors::{BashqError, Result};
use crate::types::{Command, CommandId, CommandStatus, QueueEntry, QueueId, QueueStatus};

/// Row tables guarded by the store lock.
///
/// Holding the lock for the whole of an operation is what makes the
/// multi-row transitions atomic.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Tables {
    commands: BTreeMap<CommandId, Command>,
    queue: BTreeMap<QueueId, QueueEntry>,
    next_command_id: CommandId,
    next_queue_id: QueueId,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            commands: BTreeMap::new(),
            queue: BTreeMap::new(),
            next_command_id: 1,
            next_queue_id: 1,
        }
    }
}

impl Tables {
    fn insert_command(&mut self, script: String, status: CommandStatus) -> CommandId {
        let id = self.next_command_id;
        self.next_command_id += 1;
        let now = Utc::now();
        self.commands.insert(
            id,
            Command {
                id,
                script,
                status,
                pid: None,
                output: String::new(),
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    fn insert_queue_entry(&mut self, command_id: CommandId) -> QueueId {
        let queue_id = self.next_queue_id;
        self.next_queue_id += 1;
        self.queue.insert(
            queue_id,
            QueueEntry {
                queue_id,
                command_id,
                status: QueueStatus::Waiting,
            },
        );
        queue_id
    }

    fn remove_queue_entries(&mut self, command_id: CommandId) -> usize {
        let before = self.queue.len();
        self.queue.retain(|_, entry| entry.command_id != command_id);
        before - self.queue.len()
    }

    fn count_running(&self) -> usize {
        self.commands
            .values()
            .filter(|c| c.status == CommandStatus::Running)
            .count()
    }

    fn command_mut(&mut self, id: CommandId) -> Result<&mut Command> {
        self.commands.get_mut(&id).ok_or(BashqError::NotFound(id))
    }

    /// Mark a waiting command as running and drop its queue entry.
    fn promote(&mut self, id: CommandId) -> Result<Promotion> {
        let command = self.command_mut(id)?;
        if command.status != CommandStatus::Waiting {
            return Ok(Promotion::NotQueued(command.status));
        }
        command.status = CommandStatus::Running;
        command.updated_at = Utc::now();
        let script = command.script.clone();
        self.remove_queue_entries(id);
        Ok(Promotion::Promoted { script })
    }
}

/// In-process command store.
///
/// All rows live behind one mutex. In `file` mode every mutation is also
/// mirrored into a JSON snapshot so queued work survives a restart. The file
/// is written off the lock by a [`SnapshotWriter`]; a failed write is logged
/// and does not fail the mutation.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    snapshot: Option<Arc<SnapshotWriter>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a file-backed store, loading rows from `path` if it exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let tables = match snapshot::load::<Tables>(&path)? {
            Some(tables) => {
                info!(
                    path = %path.display(),
                    commands = tables.commands.len(),
                    queued = tables.queue.len(),
                    "loaded command snapshot"
                );
                tables
            }
            None => Tables::default(),
        };
        let writer = SnapshotWriter::spawn(path)?;
        Ok(Self {
            tables: Arc::new(Mutex::new(tables)),
            snapshot: Some(Arc::new(writer)),
        })
    }

    /// Block until every mutation so far is in the snapshot file. A no-op
    /// for in-memory stores.
    pub fn flush(&self) {
        if let Some(writer) = &self.snapshot {
            writer.flush();
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| BashqError::Store("command store lock poisoned".to_string()))
    }

    /// Serialize under the lock so payloads reach the writer in mutation
    /// order.
    fn persist(&self, tables: &Tables) {
        if let Some(writer) = &self.snapshot {
            match serde_json::to_vec_pretty(tables) {
                Ok(payload) => writer.submit(payload),
                Err(err) => {
                    warn!(path = %writer.path().display(), error = %err, "failed to serialize command snapshot");
                }
            }
        }
    }

    /// Run a mutation under the lock and mirror the result to disk.
    fn mutate<T>(&self, f: impl FnOnce(&mut Tables) -> Result<T>) -> Result<T> {
        let mut tables = self.lock()?;
        let value = f(&mut tables)?;
        self.persist(&tables);
        Ok(value)
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> Result<T>) -> Result<T> {
        let tables = self.lock()?;
        f(&tables)
    }

    fn set_status(
        &self,
        id: CommandId,
        status: CommandStatus,
        output: Option<String>,
    ) -> Result<()> {
        self.mutate(|tables| {
            let command = tables.command_mut(id)?;
            if command.status.is_terminal() {
                debug!(
                    command_id = id,
                    current = %command.status,
                    requested = %status,
                    "ignoring status write on terminal command"
                );
                return Ok(());
            }
            command.status = status;
            if let Some(output) = output {
                command.output = output;
            }
            command.updated_at = Utc::now();
            Ok(())
        })
    }

    fn set_output(&self, id: CommandId, output: String) -> Result<()> {
        self.mutate(|tables| {
            let command = tables.command_mut(id)?;
            if command.status.is_terminal() {
                debug!(command_id = id, "ignoring output write on terminal command");
                return Ok(());
            }
            command.output = output;
            command.updated_at = Utc::now();
            Ok(())
        })
    }

    fn set_pid(&self, id: CommandId, pid: u32) -> Result<()> {
        self.mutate(|tables| {
            let command = tables.command_mut(id)?;
            if command.status != CommandStatus::Running {
                debug!(command_id = id, pid, status = %command.status, "ignoring pid for non-running command");
                return Ok(());
            }
            if let Some(existing) = command.pid {
                warn!(command_id = id, existing, pid, "pid already recorded; keeping the first one");
                return Ok(());
            }
            command.pid = Some(pid);
            command.updated_at = Utc::now();
            Ok(())
        })
    }
}

impl CommandStore for MemoryStore {
    fn insert_command(&self, script: String, status: CommandStatus) -> StoreFuture<'_, CommandId> {
        let result = self.mutate(|tables| Ok(tables.insert_command(script, status)));
        Box::pin(ready(result))
    }

    fn insert_queued_command(&self, script: String) -> StoreFuture<'_, CommandId> {
        let result = self.mutate(|tables| {
            let id = tables.insert_command(script, CommandStatus::Waiting);
            tables.insert_queue_entry(id);
            Ok(id)
        });
        Box::pin(ready(result))
    }

    fn update_status(
        &self,
        id: CommandId,
        status: CommandStatus,
        output: Option<String>,
    ) -> StoreFuture<'_, ()> {
        Box::pin(ready(self.set_status(id, status, output)))
    }

    fn update_output(&self, id: CommandId, output: String) -> StoreFuture<'_, ()> {
        Box::pin(ready(self.set_output(id, output)))
    }

    fn update_pid(&self, id: CommandId, pid: u32) -> StoreFuture<'_, ()> {
        Box::pin(ready(self.set_pid(id, pid)))
    }

    fn delete_queue_entry(&self, command_id: CommandId) -> StoreFuture<'_, ()> {
        let result = self.mutate(|tables| {
            tables.remove_queue_entries(command_id);
            Ok(())
        });
        Box::pin(ready(result))
    }

    fn get_command(&self, id: CommandId) -> StoreFuture<'_, Command> {
        let result = self.read(|tables| {
            tables
                .commands
                .get(&id)
                .cloned()
                .ok_or(BashqError::NotFound(id))
        });
        Box::pin(ready(result))
    }

    fn list_commands(&self) -> StoreFuture<'_, Vec<Command>> {
        let result = self.read(|tables| Ok(tables.commands.values().cloned().collect()));
        Box::pin(ready(result))
    }

    fn count_running(&self) -> StoreFuture<'_, usize> {
        Box::pin(ready(self.read(|tables| Ok(tables.count_running()))))
    }

    fn list_queue(&self) -> StoreFuture<'_, Vec<QueueEntry>> {
        let result = self.read(|tables| Ok(tables.queue.values().cloned().collect()));
        Box::pin(ready(result))
    }

    fn list_running_ids(&self) -> StoreFuture<'_, Vec<CommandId>> {
        let result = self.read(|tables| {
            Ok(tables
                .commands
                .values()
                .filter(|c| c.status == CommandStatus::Running)
                .map(|c| c.id)
                .collect())
        });
        Box::pin(ready(result))
    }

    fn admit_or_enqueue(&self, script: String, max_running: usize) -> StoreFuture<'_, Admission> {
        let result = self.mutate(|tables| {
            if tables.count_running() < max_running {
                let id = tables.insert_command(script, CommandStatus::Running);
                Ok(Admission::Admitted(id))
            } else {
                let id = tables.insert_command(script, CommandStatus::Waiting);
                tables.insert_queue_entry(id);
                Ok(Admission::Queued(id))
            }
        });
        Box::pin(ready(result))
    }

    fn promote_if_capacity(
        &self,
        id: CommandId,
        max_running: usize,
    ) -> StoreFuture<'_, Promotion> {
        let result = self.mutate(|tables| {
            if tables.count_running() >= max_running {
                let status = tables
                    .commands
                    .get(&id)
                    .map(|c| c.status)
                    .ok_or(BashqError::NotFound(id))?;
                if status != CommandStatus::Waiting {
                    return Ok(Promotion::NotQueued(status));
                }
                return Ok(Promotion::NoCapacity);
            }
            tables.promote(id)
        });
        Box::pin(ready(result))
    }

    fn force_promote(&self, id: CommandId) -> StoreFuture<'_, Promotion> {
        Box::pin(ready(self.mutate(|tables| tables.promote(id))))
    }
}
