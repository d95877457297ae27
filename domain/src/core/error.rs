//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown persona: {0}")]
    UnknownPersona(String),

    #[error("Duplicate persona: {0}")]
    DuplicatePersona(String),

    #[error("No personas configured")]
    NoPersonas,

    #[error("Input is empty")]
    EmptyInput,

    #[error("A turn must contain at least one segment")]
    EmptyTurn,
}

impl DomainError {
    /// Check if this error is a blank-input rejection
    pub fn is_empty_input(&self) -> bool {
        matches!(self, DomainError::EmptyInput)
    }
}
