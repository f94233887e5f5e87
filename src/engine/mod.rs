// src/engine/mod.rs

//! Orchestration engine for bashq.
//!
//! This module ties together:
//! - the admission controller (may a new command run now?)
//! - one queue promoter per waiting command
//! - the command service, which implements submit / list / get / stop /
//!   force-start / queue-list on top of the store and the executor
//!
//! Components talk through the [`CompletionBus`]: every time a command
//! reaches a terminal status its id is broadcast, and waiting promoters
//! re-check admission immediately instead of waiting for their next poll.

use tokio::sync::broadcast;

use crate::types::CommandId;

pub mod admission;
pub mod promoter;
pub mod service;

pub use admission::AdmissionController;
pub use promoter::{spawn_promoter, PromoterContext, PromoterRegistry};
pub use service::{CommandService, ForceStart, Recovery, SubmitStatus, Submission};

const COMPLETION_CAPACITY: usize = 256;

/// Publish/subscribe channel from "a command finished" to every promoter.
#[derive(Debug, Clone)]
pub struct CompletionBus {
    tx: broadcast::Sender<CommandId>,
}

impl CompletionBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(COMPLETION_CAPACITY);
        Self { tx }
    }

    /// Announce that `command_id` no longer occupies a running slot.
    pub fn publish(&self, command_id: CommandId) {
        // No subscribers simply means nobody is queued.
        let _ = self.tx.send(command_id);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CommandId> {
        self.tx.subscribe()
    }
}

impl Default for CompletionBus {
    fn default() -> Self {
        Self::new()
    }
}
