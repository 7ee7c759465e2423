use chrono::{DateTime, SubsecRound, Utc};

use crate::keys::PublicKey;

use super::errors::UserError;

/// A stored user account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique, externally visible identifier
    pub email: String,
    pub name: String,
    /// Unique per user; its SPKI encoding is the key-value primary key
    pub public_key: PublicKey,
    /// Opaque, never interpreted here
    pub wrapped_private_key: Vec<u8>,
    /// Opaque, never interpreted here
    pub wrapped_master_key: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input to `UserRepository::create`. Timestamps are assigned by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub public_key: PublicKey,
    pub wrapped_private_key: Vec<u8>,
    pub wrapped_master_key: Vec<u8>,
}

impl NewUser {
    /// Reject inputs that can never be stored
    pub fn validate(&self) -> Result<(), UserError> {
        let email = self.email.as_str();

        if email.is_empty() {
            return Err(UserError::InvalidData("email must not be empty".to_string()));
        }
        if email.chars().any(char::is_whitespace) {
            return Err(UserError::InvalidData(
                "email must not contain whitespace".to_string(),
            ));
        }
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
            _ => Err(UserError::InvalidData(format!(
                "'{email}' is not an email address"
            ))),
        }
    }

    /// Turn the input into a stored user, stamped with `now`
    pub(crate) fn into_user(self, now: DateTime<Utc>) -> User {
        User {
            email: self.email,
            name: self.name,
            public_key: self.public_key,
            wrapped_private_key: self.wrapped_private_key,
            wrapped_master_key: self.wrapped_master_key,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Current time at the precision every backend stores exactly
pub(crate) fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
