//! Error types for the editor

use nextnote_model::ModelError;
use thiserror::Error;

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Error, Debug)]
pub enum EditorError {
    /// A structural precondition was not met; the document is unchanged
    #[error("Command rejected: {reason}")]
    CommandRejected { reason: String },

    #[error("Invalid argument '{field}': {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Note not found: {0}")]
    NotFound(String),
}

impl EditorError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::CommandRejected {
            reason: reason.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Expected, recoverable failures the UI can show as a no-op. Model
    /// errors such as an out-of-range position mean the caller is out of
    /// sync with the document and are never recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EditorError::CommandRejected { .. } | EditorError::InvalidArgument { .. }
        )
    }
}
