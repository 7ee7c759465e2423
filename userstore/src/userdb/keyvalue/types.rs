use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::keys::PublicKey;
use crate::storage::{KeyType, TableDescription};
use crate::userdb::errors::UserError;
use crate::userdb::types::User;
use crate::utils::{base64url_bytes, base64url_encode};

/// A user as stored in the users table, keyed by [`user_key`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct UserItem {
    pub(super) email: String,
    pub(super) name: String,
    #[serde(with = "base64url_bytes")]
    pub(super) public_key: Vec<u8>,
    #[serde(with = "base64url_bytes")]
    pub(super) wrapped_private_key: Vec<u8>,
    #[serde(with = "base64url_bytes")]
    pub(super) wrapped_master_key: Vec<u8>,
    pub(super) created_at: DateTime<Utc>,
    pub(super) updated_at: DateTime<Utc>,
}

/// Email index entry, keyed by the email itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct EmailIndexItem {
    pub(super) email: String,
    #[serde(with = "base64url_bytes")]
    pub(super) public_key: Vec<u8>,
}

impl From<&User> for UserItem {
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

impl TryFrom<UserItem> for User {
    type Error = UserError;

    fn try_from(item: UserItem) -> Result<Self, Self::Error> {
        Ok(Self {
            public_key: PublicKey::from_spki_der(&item.public_key)?,
            email: item.email,
            name: item.name,
            wrapped_private_key: item.wrapped_private_key,
            wrapped_master_key: item.wrapped_master_key,
            created_at: item.created_at,
            updated_at: item.updated_at,
        })
    }
}

/// Users table key for an SPKI encoded public key
pub(super) fn user_key(public_key: &[u8]) -> String {
    base64url_encode(public_key)
}

pub(super) fn users_table_description(name: &str) -> TableDescription {
    TableDescription {
        name: name.to_string(),
        key_attribute: "public_key".to_string(),
        key_type: KeyType::Binary,
    }
}

pub(super) fn email_index_table_description(name: &str) -> TableDescription {
    TableDescription {
        name: name.to_string(),
        key_attribute: "email".to_string(),
        key_type: KeyType::String,
    }
}
