// src/engine/service.rs

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::ServiceSettings;
use crate::engine::{
    spawn_promoter, AdmissionController, CompletionBus, PromoterContext, PromoterRegistry,
};
use crate::errors::{BashqError, Result};
use crate::exec::{signal, ExecutorBackend, ShellExecutor};
use crate::store::{Admission, CommandStore, Promotion};
use crate::types::{Command, CommandId, CommandStatus, QueueEntry, ScriptKind};

/// How a submission was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitStatus {
    Queued,
    Executing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    pub status: SubmitStatus,
    pub id: CommandId,
}

/// Outcome of a force-start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceStart {
    /// The command was dequeued and launched, bypassing admission.
    Started(CommandId),
    /// Nothing changed; the command already has this status.
    AlreadyInState(CommandStatus),
}

/// What [`CommandService::recover`] found in the store at boot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recovery {
    /// Commands left `running` by a previous process, now marked `error`.
    pub interrupted: Vec<CommandId>,
    /// Queued commands that got a fresh promoter.
    pub resumed: Vec<CommandId>,
}

/// Orchestrates admission, queueing, execution and stop requests.
///
/// Cheap to clone; all clones share the same store, executor and promoter
/// registry.
#[derive(Clone)]
pub struct CommandService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    store: Arc<dyn CommandStore>,
    admission: AdmissionController,
    executor: Arc<dyn ExecutorBackend>,
    completions: CompletionBus,
    promoters: PromoterRegistry,
    settings: ServiceSettings,
}

impl fmt::Debug for CommandService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandService")
            .field("settings", &self.inner.settings)
            .field("active_promoters", &self.inner.promoters.len())
            .finish_non_exhaustive()
    }
}

impl CommandService {
    pub fn new(
        store: Arc<dyn CommandStore>,
        executor: Arc<dyn ExecutorBackend>,
        completions: CompletionBus,
        settings: ServiceSettings,
    ) -> Self {
        let admission = AdmissionController::new(Arc::clone(&store), settings.max_concurrent);
        Self {
            inner: Arc::new(ServiceInner {
                store,
                admission,
                executor,
                completions,
                promoters: PromoterRegistry::new(),
                settings,
            }),
        }
    }

    /// Build a service that runs commands through [`ShellExecutor`].
    pub fn with_shell_executor(store: Arc<dyn CommandStore>, settings: ServiceSettings) -> Self {
        let completions = CompletionBus::new();
        let executor = ShellExecutor::new(Arc::clone(&store), settings.clone(), completions.clone());
        Self::new(store, Arc::new(executor), completions, settings)
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.inner.settings
    }

    pub fn admission(&self) -> &AdmissionController {
        &self.inner.admission
    }

    pub fn completions(&self) -> &CompletionBus {
        &self.inner.completions
    }

    pub fn promoters(&self) -> &PromoterRegistry {
        &self.inner.promoters
    }

    /// Submit a script: run it now if a slot is free, otherwise queue it.
    ///
    /// Validation happens before any store write.
    pub async fn submit(&self, script: &str, kind: ScriptKind) -> Result<Submission> {
        validate_script(script, kind)?;

        // Subscribe before the row exists so no completion can slip between
        // queueing and the promoter starting.
        let wake = self.inner.completions.subscribe();

        match self.inner.admission.admit(script.to_string()).await? {
            Admission::Queued(id) => {
                info!(command_id = id, "command queued");
                self.start_promoter(id, wake);
                Ok(Submission {
                    status: SubmitStatus::Queued,
                    id,
                })
            }
            Admission::Admitted(id) => {
                info!(command_id = id, "command admitted");
                self.inner.executor.launch(id, script.to_string());
                Ok(Submission {
                    status: SubmitStatus::Executing,
                    id,
                })
            }
        }
    }

    /// All commands ordered by id.
    pub async fn list(&self) -> Result<Vec<Command>> {
        self.inner.store.list_commands().await
    }

    pub async fn get(&self, id: CommandId) -> Result<Command> {
        self.inner.store.get_command(id).await
    }

    /// Queue entries ordered by queue id.
    pub async fn queue(&self) -> Result<Vec<QueueEntry>> {
        self.inner.store.list_queue().await
    }

    /// Interrupt a running command and mark it `stopped`.
    ///
    /// The status write is optimistic and lands before the signal, so it
    /// holds even if delivery fails or the process ignores `SIGINT`, and the
    /// executor's later failure write is dropped by the terminal guard. A
    /// command that already reached a terminal status is left alone and no
    /// signal is sent, since its pid may belong to an unrelated process by
    /// now.
    pub async fn stop(&self, id: CommandId) -> Result<()> {
        let command = self.inner.store.get_command(id).await?;
        let pid = command.pid.ok_or(BashqError::NotStarted(id))?;

        if command.status.is_terminal() {
            info!(command_id = id, status = %command.status, "command already finished; nothing to stop");
            return Ok(());
        }

        self.inner
            .store
            .update_status(id, CommandStatus::Stopped, None)
            .await?;

        // The executor may have finished between the read and the write.
        let status = self.inner.store.get_command(id).await?.status;
        if status != CommandStatus::Stopped {
            info!(command_id = id, status = %status, "command finished before stop; not signalling");
            return Ok(());
        }
        self.inner.completions.publish(id);

        match signal::interrupt(pid) {
            Ok(()) => info!(command_id = id, pid, "sent SIGINT to command"),
            Err(err) => warn!(
                command_id = id,
                pid,
                error = %err,
                "failed to signal command; it stays marked stopped"
            ),
        }
        Ok(())
    }

    /// Start a waiting command immediately, ignoring the concurrency ceiling.
    ///
    /// Any status other than `waiting` is reported back unchanged.
    pub async fn force_start(&self, id: CommandId) -> Result<ForceStart> {
        let command = self.inner.store.get_command(id).await?;
        if command.status != CommandStatus::Waiting {
            info!(command_id = id, status = %command.status, "force-start ignored");
            return Ok(ForceStart::AlreadyInState(command.status));
        }

        match self.inner.store.force_promote(id).await? {
            Promotion::Promoted { script } => {
                info!(command_id = id, "force-starting command");
                self.inner.executor.launch(id, script);
                Ok(ForceStart::Started(id))
            }
            Promotion::NotQueued(status) => Ok(ForceStart::AlreadyInState(status)),
            Promotion::NoCapacity => Err(BashqError::Store(format!(
                "forced promotion of command {id} reported no capacity"
            ))),
        }
    }

    /// Stop every running command, best effort.
    ///
    /// Returns how many were stopped; individual failures are logged and do
    /// not abort the scan.
    pub async fn stop_all_running(&self) -> Result<usize> {
        let ids = self.inner.store.list_running_ids().await?;
        let mut stopped = 0;
        for id in ids {
            match self.stop(id).await {
                Ok(()) => stopped += 1,
                Err(err) => error!(command_id = id, error = %err, "failed to stop command"),
            }
        }
        Ok(stopped)
    }

    /// Reconcile the store with this process at boot.
    ///
    /// Rows still `running` have no executor any more and are marked `error`
    /// with their output kept; every queue entry gets a promoter. Call once,
    /// before the first submission.
    pub async fn recover(&self) -> Result<Recovery> {
        let mut recovery = Recovery::default();

        for id in self.inner.store.list_running_ids().await? {
            warn!(command_id = id, "command was running when the service stopped; marking error");
            self.inner
                .store
                .update_status(id, CommandStatus::Error, None)
                .await?;
            recovery.interrupted.push(id);
        }

        for entry in self.inner.store.list_queue().await? {
            let wake = self.inner.completions.subscribe();
            if self.start_promoter(entry.command_id, wake) {
                recovery.resumed.push(entry.command_id);
            }
        }

        if !recovery.interrupted.is_empty() || !recovery.resumed.is_empty() {
            info!(
                interrupted = recovery.interrupted.len(),
                resumed = recovery.resumed.len(),
                "recovered commands from store"
            );
        }
        Ok(recovery)
    }

    /// True when nothing is running or queued.
    pub async fn is_idle(&self) -> Result<bool> {
        let running = self.inner.store.count_running().await?;
        if running > 0 {
            return Ok(false);
        }
        Ok(self.inner.store.list_queue().await?.is_empty())
    }

    fn start_promoter(
        &self,
        id: CommandId,
        wake: tokio::sync::broadcast::Receiver<CommandId>,
    ) -> bool {
        let ctx = PromoterContext {
            admission: self.inner.admission.clone(),
            executor: Arc::clone(&self.inner.executor),
            poll_interval: self.inner.settings.poll_interval,
        };
        spawn_promoter(&self.inner.promoters, ctx, id, wake).is_some()
    }
}

/// Reject empty scripts, and `sudo` in scripts submitted as plain.
pub fn validate_script(script: &str, kind: ScriptKind) -> Result<()> {
    if script.trim().is_empty() {
        return Err(BashqError::Validation("script is required".to_string()));
    }
    if kind == ScriptKind::Plain && script.contains("sudo") {
        return Err(BashqError::Validation(
            "non-sudo command cannot contain 'sudo'".to_string(),
        ));
    }
    Ok(())
}
