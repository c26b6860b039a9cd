//! Database-layer error type and conversions.

use relif_core::error::RelifError;

/// PostgREST code for "JSON object requested, multiple (or no) rows returned".
pub const NO_SINGLE_ROW: &str = "PGRST116";

/// PostgREST code for an exception raised inside a procedure.
pub const RAISED: &str = "P0001";

/// Data-access error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Backend error ({status}): {message}")]
    Backend {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Auth error ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("Storage error ({status}): {message}")]
    Storage { status: u16, message: String },

    #[error("Edge function error: {status} {message}")]
    EdgeFunction { status: u16, message: String },

    #[error("Legacy API error ({status}): {message}")]
    Legacy { status: u16, message: String },

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl DbError {
    /// HTTP status of the failed call, if the error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            DbError::Http(e) => e.status().map(|s| s.as_u16()),
            DbError::Backend { status, .. }
            | DbError::Auth { status, .. }
            | DbError::Storage { status, .. }
            | DbError::EdgeFunction { status, .. }
            | DbError::Legacy { status, .. } => Some(*status),
            DbError::NotFound { .. } => Some(404),
            DbError::Unauthenticated(_) => Some(401),
            DbError::Invalid(_) => Some(400),
            DbError::Decode(_) | DbError::Config(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            DbError::Backend { code: Some(code), .. } if code == NO_SINGLE_ROW => true,
            other => other.status() == Some(404),
        }
    }

    pub(crate) fn not_found(entity: &str, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

impl From<DbError> for RelifError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => RelifError::NotFound { entity, id },
            DbError::Backend {
                code: Some(code),
                message,
                ..
            } if code == RAISED => RelifError::Validation { message },
            DbError::Backend { status: 409, message, .. } => RelifError::AlreadyExists {
                entity: message,
            },
            DbError::Backend {
                status, message, ..
            } => RelifError::Backend { status, message },
            DbError::Auth { message, .. } => RelifError::AuthenticationFailed { reason: message },
            DbError::Unauthenticated(reason) => RelifError::AuthenticationFailed { reason },
            DbError::Invalid(message) => RelifError::Validation { message },
            DbError::Storage { message, .. } => RelifError::Storage(message),
            DbError::EdgeFunction { status, message } => {
                RelifError::EdgeFunction { status, message }
            }
            DbError::Legacy { status, message } => RelifError::Legacy { status, message },
            DbError::Config(message) => RelifError::Config(message),
            DbError::Http(e) => match e.status() {
                Some(status) => RelifError::Backend {
                    status: status.as_u16(),
                    message: e.to_string(),
                },
                None => RelifError::Internal(e.to_string()),
            },
            DbError::Decode(e) => RelifError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_row_miss_counts_as_not_found() {
        let err = DbError::Backend {
            status: 406,
            code: Some(NO_SINGLE_ROW.into()),
            message: "no rows".into(),
        };
        assert!(err.is_not_found());
        assert!(DbError::not_found("housing", "x").is_not_found());
        assert!(!DbError::Config("x".into()).is_not_found());
    }

    #[test]
    fn conflict_maps_to_already_exists() {
        let err: RelifError = DbError::Backend {
            status: 409,
            code: Some("23505".into()),
            message: "duplicate key".into(),
        }
        .into();
        assert!(matches!(err, RelifError::AlreadyExists { .. }));
    }

    #[test]
    fn raised_procedure_errors_are_validation_failures() {
        let err: RelifError = DbError::Backend {
            status: 409,
            code: Some(RAISED.into()),
            message: "insufficient stock".into(),
        }
        .into();
        assert!(matches!(err, RelifError::Validation { .. }));
        assert_eq!(DbError::Invalid("quantity".into()).status(), Some(400));
    }
}
