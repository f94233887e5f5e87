use std::sync::{Arc, Mutex};

use bashq::engine::CompletionBus;
use bashq::exec::ExecutorBackend;
use bashq::store::CommandStore;
use bashq::types::{CommandId, CommandStatus};

/// A fake executor that:
/// - records which commands were launched, in order
/// - never runs anything; tests finish commands with [`RecordingExecutor::finish`]
///
/// Finishing goes through the store and the completion bus exactly like the
/// real executor does, so promoters observe it the same way.
#[derive(Clone)]
pub struct RecordingExecutor {
    store: Arc<dyn CommandStore>,
    completions: CompletionBus,
    launched: Arc<Mutex<Vec<(CommandId, String)>>>,
}

impl RecordingExecutor {
    pub fn new(store: Arc<dyn CommandStore>, completions: CompletionBus) -> Self {
        Self {
            store,
            completions,
            launched: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Launches seen so far as `(command id, script)`.
    pub fn launched(&self) -> Vec<(CommandId, String)> {
        self.launched.lock().unwrap().clone()
    }

    pub fn launched_ids(&self) -> Vec<CommandId> {
        self.launched().into_iter().map(|(id, _)| id).collect()
    }

    /// Write a terminal status with `output` and announce the completion.
    pub async fn finish(&self, id: CommandId, status: CommandStatus, output: &str) {
        assert!(status.is_terminal(), "finish needs a terminal status");
        self.store
            .update_status(id, status, Some(output.to_string()))
            .await
            .expect("finishing a command should succeed");
        self.completions.publish(id);
    }
}

impl ExecutorBackend for RecordingExecutor {
    fn launch(&self, command_id: CommandId, script: String) {
        self.launched.lock().unwrap().push((command_id, script));
    }
}
