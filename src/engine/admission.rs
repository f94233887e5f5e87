// src/engine/admission.rs

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error};

use crate::errors::Result;
use crate::store::{Admission, CommandStore, Promotion};
use crate::types::CommandId;

/// Decides whether a command may run now, against a fixed concurrency
/// ceiling.
#[derive(Clone)]
pub struct AdmissionController {
    store: Arc<dyn CommandStore>,
    max_concurrent: usize,
}

impl fmt::Debug for AdmissionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionController")
            .field("max_concurrent", &self.max_concurrent)
            .finish_non_exhaustive()
    }
}

impl AdmissionController {
    pub fn new(store: Arc<dyn CommandStore>, max_concurrent: usize) -> Self {
        Self {
            store,
            max_concurrent,
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// True when the running count has reached the ceiling.
    ///
    /// If the count cannot be read the answer is `true`: an uncertain system
    /// queues rather than over-admits.
    pub async fn should_queue(&self) -> bool {
        match self.store.count_running().await {
            Ok(running) => {
                debug!(running, max = self.max_concurrent, "admission check");
                running >= self.max_concurrent
            }
            Err(err) => {
                error!(error = %err, "failed to count running commands; assuming queue is required");
                true
            }
        }
    }

    /// Create a command and decide run-or-queue in one store transaction.
    pub async fn admit(&self, script: String) -> Result<Admission> {
        self.store
            .admit_or_enqueue(script, self.max_concurrent)
            .await
    }

    /// Promote a waiting command if a slot is free, atomically.
    pub async fn try_promote(&self, command_id: CommandId) -> Result<Promotion> {
        self.store
            .promote_if_capacity(command_id, self.max_concurrent)
            .await
    }
}
