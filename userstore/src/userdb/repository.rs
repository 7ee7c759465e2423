use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{KeyValueBackend, StoreConfig};
use crate::storage::{InMemoryKeyValueStore, KeyValueStore, RedisKeyValueStore};

use super::errors::{Operation, RepositoryError, UserError};
use super::keyvalue::KeyValueUserRepository;
use super::relational::SqlUserRepository;
use super::types::{NewUser, User};

/// Storage contract for user accounts.
///
/// Reads return a complete `User` or an error whose kind is
/// `UserError::NotFound`; never a partial record. Every call is bounded by the
/// adapter's configured deadline.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look up a user by the SPKI DER encoding of their public key
    async fn get_by_pk(&self, public_key: &[u8]) -> Result<User, RepositoryError>;

    async fn get_by_email(&self, email: &str) -> Result<User, RepositoryError>;

    /// Store a new user and return it with its timestamps.
    ///
    /// Fails with `UserError::AlreadyExists` when the email or the public key
    /// is already taken; nothing is written in that case.
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    async fn delete_by_email(&self, email: &str) -> Result<(), RepositoryError>;

    fn backend_name(&self) -> &'static str;
}

/// Run `fut`, failing with `UserError::Timeout` once `limit` has passed
pub(crate) async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, UserError>
where
    F: Future<Output = Result<T, UserError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(UserError::Timeout(limit)),
    }
}

/// Build the repository selected by `config`, provisioning its tables
pub async fn open_repository(
    config: &StoreConfig,
) -> Result<Arc<dyn UserRepository>, RepositoryError> {
    tracing::info!(backend = config.backend_name(), "Opening user repository");

    let repository: Arc<dyn UserRepository> = match config {
        StoreConfig::Relational(config) => Arc::new(SqlUserRepository::connect(config).await?),
        StoreConfig::KeyValue(config) => {
            let store: Arc<dyn KeyValueStore> = match &config.backend {
                KeyValueBackend::Memory => Arc::new(InMemoryKeyValueStore::new()),
                KeyValueBackend::Redis { url } => Arc::new(
                    RedisKeyValueStore::connect(url, &config.key_prefix)
                        .await
                        .map_err(|e| {
                            RepositoryError::new(Operation::Provision, "redis", e.into()).log()
                        })?,
                ),
            };
            Arc::new(KeyValueUserRepository::open(store, config).await?)
        }
    };

    Ok(repository)
}
