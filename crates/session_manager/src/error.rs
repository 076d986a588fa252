//! Session manager error types

use board_core::Role;
use thiserror::Error;

use crate::structs::SessionPhase;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{0}")]
    InvalidCredentials(String),

    #[error("Access denied. {required} privileges required.")]
    AccessDenied { required: Role },

    #[error("Session expired: {0}")]
    SessionExpired(String),

    #[error("{0}")]
    Api(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Invalid session transition from {from:?} to {to:?}")]
    InvalidTransition { from: SessionPhase, to: SessionPhase },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SessionError {
    /// Failures that leave the caller with no usable credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            SessionError::InvalidCredentials(_)
                | SessionError::AccessDenied { .. }
                | SessionError::SessionExpired(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
