use thiserror::Error;

use crate::keys::KeyError;
use crate::userdb::{RepositoryError, UserError};

/// Failure classes exposed to callers of [`super::UserService`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        let message = format!("{err}: {}", err.kind());
        match err.kind() {
            UserError::NotFound => Self::NotFound(message),
            UserError::AlreadyExists(_) => Self::Conflict(message),
            UserError::InvalidData(_) => Self::InvalidArgument(message),
            UserError::Key(_)
            | UserError::Inconsistent(_)
            | UserError::Storage(_)
            | UserError::Timeout(_) => Self::Internal(message),
        }
    }
}

/// A key supplied by the caller that does not decode
impl From<KeyError> for ServiceError {
    fn from(err: KeyError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}
