//! Error types for the Relif data-access layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelifError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Legacy API error ({status}): {message}")]
    Legacy { status: u16, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Edge function error: {status} {message}")]
    EdgeFunction { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelifError {
    /// HTTP status carried by the error, when it came from a remote call.
    pub fn status(&self) -> Option<u16> {
        match self {
            RelifError::NotFound { .. } => Some(404),
            RelifError::AlreadyExists { .. } => Some(409),
            RelifError::AuthenticationFailed { .. } => Some(401),
            RelifError::Backend { status, .. }
            | RelifError::Legacy { status, .. }
            | RelifError::EdgeFunction { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type RelifResult<T> = Result<T, RelifError>;
