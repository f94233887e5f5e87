// src/engine/promoter.rs

//! Per-command background loop that moves a waiting command to running once
//! admission allows it.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::engine::AdmissionController;
use crate::errors::BashqError;
use crate::exec::ExecutorBackend;
use crate::store::Promotion;
use crate::types::CommandId;

/// Set of command ids that currently have a live promoter.
#[derive(Debug, Clone, Default)]
pub struct PromoterRegistry {
    active: Arc<Mutex<HashSet<CommandId>>>,
}

impl PromoterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn active(&self) -> MutexGuard<'_, HashSet<CommandId>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserve `command_id`; false if a promoter already owns it.
    fn claim(&self, command_id: CommandId) -> bool {
        self.active().insert(command_id)
    }

    fn release(&self, command_id: CommandId) {
        self.active().remove(&command_id);
    }

    pub fn is_active(&self, command_id: CommandId) -> bool {
        self.active().contains(&command_id)
    }

    pub fn len(&self) -> usize {
        self.active().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases the registry slot however the promoter task ends.
struct Claim {
    registry: PromoterRegistry,
    command_id: CommandId,
}

impl Drop for Claim {
    fn drop(&mut self) {
        self.registry.release(self.command_id);
    }
}

/// Shared dependencies of every promoter.
#[derive(Clone)]
pub struct PromoterContext {
    pub admission: AdmissionController,
    pub executor: Arc<dyn ExecutorBackend>,
    pub poll_interval: Duration,
}

/// Start the promoter for `command_id` unless one is already running.
///
/// `wake` should be subscribed before the command was queued so that a
/// completion in between is not missed.
pub fn spawn_promoter(
    registry: &PromoterRegistry,
    ctx: PromoterContext,
    command_id: CommandId,
    wake: broadcast::Receiver<CommandId>,
) -> Option<JoinHandle<()>> {
    if !registry.claim(command_id) {
        debug!(command_id, "promoter already active; not starting another");
        return None;
    }
    let claim = Claim {
        registry: registry.clone(),
        command_id,
    };

    Some(tokio::spawn(async move {
        let _claim = claim;
        promote_when_admitted(ctx, command_id, Some(wake)).await;
    }))
}

async fn promote_when_admitted(
    ctx: PromoterContext,
    command_id: CommandId,
    mut wake: Option<broadcast::Receiver<CommandId>>,
) {
    debug!(command_id, "queue promoter started");

    loop {
        wait_for_tick(&mut wake, ctx.poll_interval).await;

        if ctx.admission.should_queue().await {
            continue;
        }

        match ctx.admission.try_promote(command_id).await {
            Ok(Promotion::Promoted { script }) => {
                info!(command_id, "promoting queued command to running");
                ctx.executor.launch(command_id, script);
                return;
            }
            Ok(Promotion::NoCapacity) => {
                debug!(command_id, "slot taken before promotion; waiting again");
            }
            Ok(Promotion::NotQueued(status)) => {
                info!(command_id, status = %status, "command no longer queued; promoter exiting");
                return;
            }
            Err(BashqError::NotFound(_)) => {
                warn!(command_id, "queued command disappeared; promoter exiting");
                return;
            }
            Err(err) => {
                warn!(command_id, error = %err, "promotion failed; retrying on next tick");
            }
        }
    }
}

/// Sleep for one poll interval, or less if a completion is announced.
async fn wait_for_tick(wake: &mut Option<broadcast::Receiver<CommandId>>, interval: Duration) {
    let closed = match wake.as_mut() {
        Some(rx) => {
            tokio::select! {
                _ = sleep(interval) => false,
                received = rx.recv() => matches!(received, Err(RecvError::Closed)),
            }
        }
        None => {
            sleep(interval).await;
            false
        }
    };
    if closed {
        *wake = None;
    }
}
