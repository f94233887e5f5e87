use std::future::ready;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use bashq::errors::BashqError;
use bashq::store::{Admission, CommandStore, MemoryStore, Promotion, StoreFuture};
use bashq::types::{Command, CommandId, CommandStatus, QueueEntry};

/// A `MemoryStore` wrapper whose operations can be made to fail on demand.
///
/// Each toggle covers one family of calls; everything else passes through
/// to the inner store untouched.
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_count_running: Arc<AtomicBool>,
    fail_output_writes: Arc<AtomicBool>,
    fail_promotions: Arc<AtomicBool>,
    fail_pid_writes: Arc<AtomicBool>,
    output_writes: Arc<AtomicUsize>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Make `count_running` fail.
    pub fn fail_count_running(&self, fail: bool) {
        self.fail_count_running.store(fail, Ordering::SeqCst);
    }

    /// Make `update_output` fail.
    pub fn fail_output_writes(&self, fail: bool) {
        self.fail_output_writes.store(fail, Ordering::SeqCst);
    }

    /// Make `promote_if_capacity` fail.
    pub fn fail_promotions(&self, fail: bool) {
        self.fail_promotions.store(fail, Ordering::SeqCst);
    }

    /// Make `update_pid` fail.
    pub fn fail_pid_writes(&self, fail: bool) {
        self.fail_pid_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `update_output` calls seen, failed ones included.
    pub fn output_writes(&self) -> usize {
        self.output_writes.load(Ordering::SeqCst)
    }

    fn injected<T: Send + 'static>(what: &str) -> StoreFuture<'static, T> {
        Box::pin(ready(Err(BashqError::Store(format!("injected {what} failure")))))
    }
}

impl CommandStore for FlakyStore {
    fn insert_command(&self, script: String, status: CommandStatus) -> StoreFuture<'_, CommandId> {
        self.inner.insert_command(script, status)
    }

    fn insert_queued_command(&self, script: String) -> StoreFuture<'_, CommandId> {
        self.inner.insert_queued_command(script)
    }

    fn update_status(
        &self,
        id: CommandId,
        status: CommandStatus,
        output: Option<String>,
    ) -> StoreFuture<'_, ()> {
        self.inner.update_status(id, status, output)
    }

    fn update_output(&self, id: CommandId, output: String) -> StoreFuture<'_, ()> {
        self.output_writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_output_writes.load(Ordering::SeqCst) {
            return Self::injected("output write");
        }
        self.inner.update_output(id, output)
    }

    fn update_pid(&self, id: CommandId, pid: u32) -> StoreFuture<'_, ()> {
        if self.fail_pid_writes.load(Ordering::SeqCst) {
            return Self::injected("pid write");
        }
        self.inner.update_pid(id, pid)
    }

    fn delete_queue_entry(&self, command_id: CommandId) -> StoreFuture<'_, ()> {
        self.inner.delete_queue_entry(command_id)
    }

    fn get_command(&self, id: CommandId) -> StoreFuture<'_, Command> {
        self.inner.get_command(id)
    }

    fn list_commands(&self) -> StoreFuture<'_, Vec<Command>> {
        self.inner.list_commands()
    }

    fn count_running(&self) -> StoreFuture<'_, usize> {
        if self.fail_count_running.load(Ordering::SeqCst) {
            return Self::injected("count");
        }
        self.inner.count_running()
    }

    fn list_queue(&self) -> StoreFuture<'_, Vec<QueueEntry>> {
        self.inner.list_queue()
    }

    fn list_running_ids(&self) -> StoreFuture<'_, Vec<CommandId>> {
        self.inner.list_running_ids()
    }

    fn admit_or_enqueue(&self, script: String, max_running: usize) -> StoreFuture<'_, Admission> {
        self.inner.admit_or_enqueue(script, max_running)
    }

    fn promote_if_capacity(
        &self,
        id: CommandId,
        max_running: usize,
    ) -> StoreFuture<'_, Promotion> {
        if self.fail_promotions.load(Ordering::SeqCst) {
            return Self::injected("promotion");
        }
        self.inner.promote_if_capacity(id, max_running)
    }

    fn force_promote(&self, id: CommandId) -> StoreFuture<'_, Promotion> {
        self.inner.force_promote(id)
    }
}
