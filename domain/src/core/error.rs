//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("No agent credentials provided")]
    MissingCredentials,

    #[error("Display name cannot be empty")]
    EmptyName,

    #[error("Record mutation rejected: {0}")]
    InvalidMutation(String),
}

impl DomainError {
    /// Check if this error is a credential error
    pub fn is_credential_error(&self) -> bool {
        matches!(self, DomainError::MissingCredentials)
    }
}
