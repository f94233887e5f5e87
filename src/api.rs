// src/api.rs

//! Request and response shapes for whatever transport fronts the service.
//!
//! The HTTP layer itself lives outside this crate; these types pin down the
//! JSON it exchanges and how service errors map onto status codes.

use serde::{Deserialize, Serialize};

use crate::engine::{ForceStart, SubmitStatus, Submission};
use crate::errors::BashqError;
use crate::types::{CommandId, CommandStatus};

/// Body of a submit request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub script: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitResponse {
    pub status: SubmitStatus,
    pub id: CommandId,
    pub message: String,
}

impl From<Submission> for SubmitResponse {
    fn from(submission: Submission) -> Self {
        let message = match submission.status {
            SubmitStatus::Queued => "Command is being queued",
            SubmitStatus::Executing => "Command is being executed",
        };
        Self {
            status: submission.status,
            id: submission.id,
            message: message.to_string(),
        }
    }
}

/// Force-start reply. `started` is false for the informational no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForceStartResponse {
    pub id: CommandId,
    pub started: bool,
    pub status: CommandStatus,
    pub message: String,
}

impl ForceStartResponse {
    pub fn new(id: CommandId, outcome: ForceStart) -> Self {
        match outcome {
            ForceStart::Started(id) => Self {
                id,
                started: true,
                status: CommandStatus::Running,
                message: "Command is being forcibly started".to_string(),
            },
            ForceStart::AlreadyInState(status) => Self {
                id,
                started: false,
                status,
                message: format!("Command is already {status}"),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error body plus the status code to send it with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    #[serde(skip)]
    pub status_code: u16,
    pub error: String,
}

impl From<&BashqError> for ErrorResponse {
    fn from(err: &BashqError) -> Self {
        let status_code = err.status_code();
        // Internal details stay in the logs.
        let error = if status_code >= 500 {
            "internal error".to_string()
        } else {
            err.to_string()
        };
        Self { status_code, error }
    }
}

/// Parse a command id taken from a path segment.
pub fn parse_command_id(raw: &str) -> Result<CommandId, BashqError> {
    raw.trim()
        .parse::<CommandId>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| BashqError::Validation(format!("invalid command id: {raw:?}")))
}
