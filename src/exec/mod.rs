// src/exec/mod.rs

//! Process execution layer.
//!
//! Runs submitted scripts through `tokio::process::Command` and reports
//! everything back through the command store.
//!
//! - [`backend`] provides the `ExecutorBackend` trait and the production
//!   `ShellExecutor`.
//! - [`process`] is the per-command execution body.
//! - [`buffer`] holds the combined output buffer and the pipe readers.
//! - [`streamer`] flushes in-flight output into the store.
//! - [`signal`] delivers `SIGINT` for stop requests.

pub mod backend;
pub mod buffer;
pub mod process;
pub mod signal;
pub mod streamer;

use std::fmt;
use std::sync::Arc;

use crate::config::ServiceSettings;
use crate::engine::CompletionBus;
use crate::store::CommandStore;

pub use backend::{ExecutorBackend, ShellExecutor};
pub use buffer::OutputBuffer;
pub use process::run_command;
pub use streamer::stream_output;

/// Everything one execution needs, shared by all executions of a backend.
pub struct ExecContext {
    pub store: Arc<dyn CommandStore>,
    pub settings: ServiceSettings,
    pub completions: CompletionBus,
}

impl fmt::Debug for ExecContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecContext")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
