use serde::{Deserialize, Serialize};

use crate::userdb::User;
use crate::utils::base64url_bytes;

/// Byte fields travel as unpadded base64url strings; the public key is its
/// SPKI DER encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    #[serde(with = "base64url_bytes")]
    pub public_key: Vec<u8>,
    #[serde(with = "base64url_bytes")]
    pub wrapped_private_key: Vec<u8>,
    #[serde(with = "base64url_bytes")]
    pub wrapped_master_key: Vec<u8>,
}

/// A stored user; timestamps are unix seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
    #[serde(with = "base64url_bytes")]
    pub public_key: Vec<u8>,
    #[serde(with = "base64url_bytes")]
    pub wrapped_private_key: Vec<u8>,
    #[serde(with = "base64url_bytes")]
    pub wrapped_master_key: Vec<u8>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPublicKeyResponse {
    pub email: String,
    #[serde(with = "base64url_bytes")]
    pub public_key: Vec<u8>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            public_key: user.public_key.to_spki_der(),
            email: user.email,
            name: user.name,
            wrapped_private_key: user.wrapped_private_key,
            wrapped_master_key: user.wrapped_master_key,
            created_at: user.created_at.timestamp(),
            updated_at: user.updated_at.timestamp(),
        }
    }
}

impl From<User> for UserPublicKeyResponse {
    fn from(user: User) -> Self {
        Self {
            public_key: user.public_key.to_spki_der(),
            email: user.email,
        }
    }
}
