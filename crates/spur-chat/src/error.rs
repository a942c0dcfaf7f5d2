//! Error types for the chat core.

use spur_core::error::SpurError;

/// Errors from the chat core.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<SpurError> for ChatError {
    fn from(err: SpurError) -> Self {
        ChatError::Storage(err.to_string())
    }
}
