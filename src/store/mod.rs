// src/store/mod.rs

//! Durable record of commands and queue entries.
//!
//! The engine only talks to a [`CommandStore`]; production uses
//! [`MemoryStore`] (optionally mirrored to a JSON snapshot file) and tests
//! can wrap it to inject failures.
//!
//! Besides row-level CRUD the trait exposes the guarded transactions the
//! engine relies on for atomic state changes:
//! - [`CommandStore::insert_queued_command`]: command + queue entry.
//! - [`CommandStore::admit_or_enqueue`]: count running and insert, as one step.
//! - [`CommandStore::promote_if_capacity`] / [`CommandStore::force_promote`]:
//!   dequeue and mark running, as one step.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::types::{Command, CommandId, CommandStatus, QueueEntry};

pub mod memory;
pub mod snapshot;

pub use memory::MemoryStore;

/// Boxed future returned by every store operation.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Result of the atomic admission transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Created directly in `running`; the caller must start the executor.
    Admitted(CommandId),
    /// Created in `waiting` together with a queue entry.
    Queued(CommandId),
}

impl Admission {
    pub fn command_id(self) -> CommandId {
        match self {
            Admission::Admitted(id) | Admission::Queued(id) => id,
        }
    }
}

/// Result of a dequeue-and-run transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Promotion {
    /// The queue entry was deleted and the command is now `running`.
    Promoted { script: String },
    /// The ceiling is still reached; nothing changed.
    NoCapacity,
    /// The command is no longer waiting (force-started, stopped, ...).
    NotQueued(CommandStatus),
}

/// Storage contract consumed by the engine.
///
/// Writes against a command whose status is terminal are ignored, so a
/// late executor or streamer write can never change a finished row.
pub trait CommandStore: Send + Sync {
    /// Insert a command row with the given status and return its id.
    fn insert_command(&self, script: String, status: CommandStatus) -> StoreFuture<'_, CommandId>;

    /// Insert a `waiting` command and its queue entry in one transaction.
    fn insert_queued_command(&self, script: String) -> StoreFuture<'_, CommandId>;

    /// Set the status, and the output when given.
    fn update_status(
        &self,
        id: CommandId,
        status: CommandStatus,
        output: Option<String>,
    ) -> StoreFuture<'_, ()>;

    /// Replace the captured output of a running command.
    fn update_output(&self, id: CommandId, output: String) -> StoreFuture<'_, ()>;

    /// Record the child pid. Applied at most once, and only while running.
    fn update_pid(&self, id: CommandId, pid: u32) -> StoreFuture<'_, ()>;

    fn delete_queue_entry(&self, command_id: CommandId) -> StoreFuture<'_, ()>;

    /// Fetch a command, failing with `NotFound` for unknown ids.
    fn get_command(&self, id: CommandId) -> StoreFuture<'_, Command>;

    /// All commands ordered by id.
    fn list_commands(&self) -> StoreFuture<'_, Vec<Command>>;

    fn count_running(&self) -> StoreFuture<'_, usize>;

    /// All queue entries ordered by queue id.
    fn list_queue(&self) -> StoreFuture<'_, Vec<QueueEntry>>;

    fn list_running_ids(&self) -> StoreFuture<'_, Vec<CommandId>>;

    /// Count running commands and insert the new one as `running` when below
    /// `max_running`, or as `waiting` plus a queue entry otherwise.
    fn admit_or_enqueue(&self, script: String, max_running: usize) -> StoreFuture<'_, Admission>;

    /// Promote a waiting command when fewer than `max_running` commands run.
    fn promote_if_capacity(&self, id: CommandId, max_running: usize)
    -> StoreFuture<'_, Promotion>;

    /// Promote a command regardless of the ceiling, provided it is still
    /// waiting.
    fn force_promote(&self, id: CommandId) -> StoreFuture<'_, Promotion>;
}
