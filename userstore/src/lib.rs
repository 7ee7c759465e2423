//! userstore - user account storage with interchangeable backends
//!
//! Users (email, name, ECDSA public key and two opaque wrapped-key blobs) are
//! stored either in one SQL table (SQLite or PostgreSQL) or in a key-value
//! store (Redis or in-process memory) that keeps an email index next to the
//! users table. Both adapters implement [`UserRepository`]; pick one at
//! startup with [`StoreConfig`] and [`open_repository`].

mod config;
mod keys;
mod service;
mod storage;
mod userdb;
mod utils;

#[cfg(test)]
mod test_utils;

pub use config::{
    ConfigError, KeyValueBackend, KeyValueConfig, RelationalBackend, RelationalConfig, StoreConfig,
};
pub use keys::{EcCurve, EcdsaPublicKey, KeyError, PublicKey, fingerprint};
pub use service::{
    CreateUserRequest, ServiceError, UserPublicKeyResponse, UserResponse, UserService,
};
pub use storage::{
    Condition, InMemoryKeyValueStore, KeyType, KeyValueStore, RedisKeyValueStore, StorageError,
    TableDescription, WriteOp,
};
pub use userdb::{
    KeyValueUserRepository, NewUser, Operation, RepositoryError, SqlUserRepository, User,
    UserError, UserRepository, open_repository,
};
pub use utils::{UtilError, base64url_decode, base64url_encode};
