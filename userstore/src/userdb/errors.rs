use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::keys::KeyError;
use crate::storage::StorageError;

/// What went wrong, independent of which operation hit it
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("User already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Public key error: {0}")]
    Key(#[from] KeyError),

    /// Stored records contradict each other
    #[error("Inconsistent storage: {0}")]
    Inconsistent(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

impl From<StorageError> for UserError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Serde(msg) => Self::InvalidData(msg),
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for UserError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidData(err.to_string())
    }
}

impl From<sqlx::Error> for UserError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Repository operation an error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetByPk,
    GetByEmail,
    Create,
    DeleteByEmail,
    Provision,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GetByPk => "get user by public key",
            Self::GetByEmail => "get user by email",
            Self::Create => "create user",
            Self::DeleteByEmail => "delete user by email",
            Self::Provision => "provision user tables",
        };
        f.write_str(name)
    }
}

/// Error returned by every repository method.
///
/// Carries the failed operation and its subject (an email, a key fingerprint
/// or a table name). The underlying `UserError` stays reachable through
/// [`RepositoryError::kind`] and through `std::error::Error::source`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Failed to {operation} ({subject})")]
pub struct RepositoryError {
    operation: Operation,
    subject: String,
    #[source]
    kind: UserError,
}

impl RepositoryError {
    pub fn new(operation: Operation, subject: impl Into<String>, kind: UserError) -> Self {
        Self {
            operation,
            subject: subject.into(),
            kind,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn kind(&self) -> &UserError {
        &self.kind
    }

    pub fn into_kind(self) -> UserError {
        self.kind
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, UserError::NotFound)
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self.kind, UserError::AlreadyExists(_))
    }

    /// Log the error and hand it back, for use in `map_err` chains
    pub fn log(self) -> Self {
        match &self.kind {
            UserError::NotFound | UserError::AlreadyExists(_) => {
                tracing::info!(operation = %self.operation, subject = %self.subject, "{}", self.kind);
            }
            _ => {
                tracing::error!(operation = %self.operation, subject = %self.subject, "{}", self.kind);
            }
        }
        self
    }
}
