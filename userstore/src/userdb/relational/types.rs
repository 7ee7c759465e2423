use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::keys::PublicKey;
use crate::userdb::errors::UserError;
use crate::userdb::types::User;

/// One row of the users table
#[derive(Debug, Clone, FromRow)]
pub(super) struct UserRow {
    pub(super) email: String,
    pub(super) name: String,
    pub(super) public_key: Vec<u8>,
    pub(super) wrapped_private_key: Vec<u8>,
    pub(super) wrapped_master_key: Vec<u8>,
    pub(super) created_at: DateTime<Utc>,
    pub(super) updated_at: DateTime<Utc>,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            name: user.name.clone(),
            public_key: user.public_key.to_spki_der(),
            wrapped_private_key: user.wrapped_private_key.clone(),
            wrapped_master_key: user.wrapped_master_key.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl TryFrom<UserRow> for User {
    type Error = UserError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            public_key: PublicKey::from_spki_der(&row.public_key)?,
            email: row.email,
            name: row.name,
            wrapped_private_key: row.wrapped_private_key,
            wrapped_master_key: row.wrapped_master_key,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Translate an insert failure, turning unique violations into `AlreadyExists`
pub(super) fn map_insert_error(err: sqlx::Error, email: &str) -> UserError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            UserError::AlreadyExists(format!("email or public key of {email} already registered"))
        }
        _ => UserError::from(err),
    }
}
