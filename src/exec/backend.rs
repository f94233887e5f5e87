// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The command service launches work through an `ExecutorBackend` instead of
//! spawning processes itself, so tests can swap in a fake that records
//! launches and finishes commands on demand.

use std::sync::Arc;

use crate::config::ServiceSettings;
use crate::engine::CompletionBus;
use crate::exec::process::run_command;
use crate::exec::ExecContext;
use crate::store::CommandStore;
use crate::types::CommandId;

/// Trait abstracting how an admitted command is executed.
///
/// `launch` is fire-and-forget: it must return immediately, and every result
/// is observed through the store. Implementations publish the command id on
/// the completion bus once the row is terminal.
pub trait ExecutorBackend: Send + Sync {
    fn launch(&self, command_id: CommandId, script: String);
}

/// Production backend: one Tokio task per command running a shell child.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    ctx: Arc<ExecContext>,
}

impl ShellExecutor {
    pub fn new(
        store: Arc<dyn CommandStore>,
        settings: ServiceSettings,
        completions: CompletionBus,
    ) -> Self {
        Self {
            ctx: Arc::new(ExecContext {
                store,
                settings,
                completions,
            }),
        }
    }
}

impl ExecutorBackend for ShellExecutor {
    fn launch(&self, command_id: CommandId, script: String) {
        let ctx = Arc::clone(&self.ctx);
        tokio::spawn(async move {
            run_command(&ctx, command_id, script).await;
        });
    }
}
