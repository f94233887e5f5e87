// src/types.rs

//! Core data model shared by the store, the engine and the executor.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the store when a command row is created.
pub type CommandId = i64;

/// Identifier of a queue entry, assigned in insertion order.
pub type QueueId = i64;

/// Lifecycle status of a submitted command.
///
/// `waiting -> running -> {completed, error, stopped}`; the three terminal
/// statuses are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Waiting,
    Running,
    Completed,
    Error,
    Stopped,
}

impl CommandStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CommandStatus::Completed | CommandStatus::Error | CommandStatus::Stopped
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CommandStatus::Waiting => "waiting",
            CommandStatus::Running => "running",
            CommandStatus::Completed => "completed",
            CommandStatus::Error => "error",
            CommandStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "waiting" => Ok(CommandStatus::Waiting),
            "running" => Ok(CommandStatus::Running),
            "completed" => Ok(CommandStatus::Completed),
            "error" => Ok(CommandStatus::Error),
            "stopped" => Ok(CommandStatus::Stopped),
            other => Err(format!("invalid command status: {other}")),
        }
    }
}

/// One row per submitted script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub id: CommandId,
    pub script: String,
    pub status: CommandStatus,
    /// OS process id of the child; set once, only while running.
    pub pid: Option<u32>,
    /// Combined stdout/stderr captured so far.
    pub output: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Status of a queue entry. Entries are deleted on promotion, so `waiting`
/// is the only value ever stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Waiting,
}

/// Waiting-list record for a command that has not been admitted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub queue_id: QueueId,
    pub command_id: CommandId,
    pub status: QueueStatus,
}

/// Which submission endpoint a script came through.
///
/// Plain scripts may not mention `sudo`; sudo scripts skip that check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptKind {
    #[default]
    Plain,
    Sudo,
}
