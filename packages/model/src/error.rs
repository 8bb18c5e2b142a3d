use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Position {pos} out of range (document size {size})")]
    PositionOutOfRange { pos: usize, size: usize },

    #[error("Could not load document: {reason}")]
    Serialization { reason: String },

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),
}

impl ModelError {
    pub fn out_of_range(pos: usize, size: usize) -> Self {
        Self::PositionOutOfRange { pos, size }
    }

    pub fn serialization(reason: impl Into<String>) -> Self {
        Self::Serialization {
            reason: reason.into(),
        }
    }

    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure(message.into())
    }
}
