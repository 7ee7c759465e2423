use std::time::Duration;

use async_trait::async_trait;

use crate::config::RelationalConfig;
use crate::keys::fingerprint;
use crate::storage::{DataStore, connect_data_store};
use crate::userdb::errors::{Operation, RepositoryError, UserError};
use crate::userdb::repository::{UserRepository, with_timeout};
use crate::userdb::types::{NewUser, User, now_micros};

use super::postgres::*;
use super::sqlite::*;

/// Users in a single SQL table, with the engine enforcing unique email and public key
pub struct SqlUserRepository {
    store: Box<dyn DataStore>,
    table_name: String,
    query_timeout: Duration,
}

fn unsupported_database() -> UserError {
    UserError::Storage("Unsupported database type".to_string())
}

/// Log the outcome of a lookup and turn a miss into `NotFound`
fn found_or_not_found(result: Result<Option<User>, UserError>) -> Result<User, UserError> {
    match result {
        Ok(Some(user)) => {
            tracing::info!(found = true, "User lookup completed");
            Ok(user)
        }
        Ok(None) => {
            tracing::info!(found = false, "User lookup completed - not found");
            Err(UserError::NotFound)
        }
        Err(e) => Err(e),
    }
}

impl SqlUserRepository {
    /// Open the pool and make sure the users table exists with the expected columns
    pub async fn connect(config: &RelationalConfig) -> Result<Self, RepositoryError> {
        let table_name = config.table_name();
        let provision_error =
            |e: UserError| RepositoryError::new(Operation::Provision, table_name.clone(), e).log();

        let store = connect_data_store(config).map_err(|e| provision_error(e.into()))?;
        let repository = Self {
            store,
            table_name: table_name.clone(),
            query_timeout: config.query_timeout,
        };

        with_timeout(config.query_timeout, repository.init())
            .await
            .map_err(provision_error)?;

        tracing::info!(
            backend = repository.store.backend_name(),
            table = %repository.table_name,
            "User table ready"
        );
        Ok(repository)
    }

    async fn init(&self) -> Result<(), UserError> {
        let table_name = self.table_name.as_str();

        match (self.store.as_sqlite(), self.store.as_postgres()) {
            (Some(pool), _) => {
                create_tables_sqlite(pool, table_name).await?;
                validate_user_tables_sqlite(pool, table_name).await
            }
            (_, Some(pool)) => {
                create_tables_postgres(pool, table_name).await?;
                validate_user_tables_postgres(pool, table_name).await
            }
            _ => Err(unsupported_database()),
        }
    }
}

#[async_trait]
impl UserRepository for SqlUserRepository {
    #[tracing::instrument(skip(self, public_key), fields(key = %fingerprint(public_key)))]
    async fn get_by_pk(&self, public_key: &[u8]) -> Result<User, RepositoryError> {
        let table_name = self.table_name.as_str();

        let result = with_timeout(self.query_timeout, async {
            if let Some(pool) = self.store.as_sqlite() {
                get_user_by_pk_sqlite(pool, table_name, public_key).await
            } else if let Some(pool) = self.store.as_postgres() {
                get_user_by_pk_postgres(pool, table_name, public_key).await
            } else {
                Err(unsupported_database())
            }
        })
        .await;

        found_or_not_found(result).map_err(|e| {
            RepositoryError::new(Operation::GetByPk, fingerprint(public_key), e).log()
        })
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_email(&self, email: &str) -> Result<User, RepositoryError> {
        let table_name = self.table_name.as_str();

        let result = with_timeout(self.query_timeout, async {
            if let Some(pool) = self.store.as_sqlite() {
                get_user_by_email_sqlite(pool, table_name, email).await
            } else if let Some(pool) = self.store.as_postgres() {
                get_user_by_email_postgres(pool, table_name, email).await
            } else {
                Err(unsupported_database())
            }
        })
        .await;

        found_or_not_found(result)
            .map_err(|e| RepositoryError::new(Operation::GetByEmail, email, e).log())
    }

    #[tracing::instrument(skip(self, user), fields(email = %user.email))]
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let email = user.email.clone();
        let table_name = self.table_name.as_str();

        let result = with_timeout(self.query_timeout, async {
            user.validate()?;
            let user = user.into_user(now_micros());

            if let Some(pool) = self.store.as_sqlite() {
                insert_user_sqlite(pool, table_name, &user).await?;
            } else if let Some(pool) = self.store.as_postgres() {
                insert_user_postgres(pool, table_name, &user).await?;
            } else {
                return Err(unsupported_database());
            }
            Ok(user)
        })
        .await;

        match result {
            Ok(user) => {
                tracing::info!(key = %user.public_key.fingerprint(), "User created");
                Ok(user)
            }
            Err(e) => Err(RepositoryError::new(Operation::Create, email, e).log()),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn delete_by_email(&self, email: &str) -> Result<(), RepositoryError> {
        let table_name = self.table_name.as_str();

        let result = with_timeout(self.query_timeout, async {
            let deleted = if let Some(pool) = self.store.as_sqlite() {
                delete_user_by_email_sqlite(pool, table_name, email).await?
            } else if let Some(pool) = self.store.as_postgres() {
                delete_user_by_email_postgres(pool, table_name, email).await?
            } else {
                return Err(unsupported_database());
            };

            if deleted == 0 {
                return Err(UserError::NotFound);
            }
            Ok(())
        })
        .await;

        match result {
            Ok(()) => {
                tracing::info!("User deleted");
                Ok(())
            }
            Err(e) => Err(RepositoryError::new(Operation::DeleteByEmail, email, e).log()),
        }
    }

    fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }
}
