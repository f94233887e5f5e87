// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::types::CommandId;

#[derive(Error, Debug)]
pub enum BashqError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Command not found: {0}")]
    NotFound(CommandId),

    #[error("Command {0} has no recorded pid; it may not have been started yet")]
    NotStarted(CommandId),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BashqError {
    /// HTTP-equivalent status code for callers of the synchronous API.
    pub fn status_code(&self) -> u16 {
        match self {
            BashqError::Validation(_) => 400,
            BashqError::NotFound(_) | BashqError::NotStarted(_) => 404,
            _ => 500,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BashqError>;
