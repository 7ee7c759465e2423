use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{KeyValueBackend, KeyValueConfig};
use crate::keys::fingerprint;
use crate::storage::{Condition, KeyValueStore, StorageError, TableDescription, WriteOp};
use crate::userdb::errors::{Operation, RepositoryError, UserError};
use crate::userdb::repository::{UserRepository, with_timeout};
use crate::userdb::types::{NewUser, User, now_micros};

use super::types::{
    EmailIndexItem, UserItem, email_index_table_description, user_key, users_table_description,
};

/// Users in a key-value store: a users table keyed by public key plus an
/// email index table pointing at it.
///
/// Both tables are only ever changed together, in one conditional
/// transaction, so an index entry always has its user and vice versa.
pub struct KeyValueUserRepository {
    store: Arc<dyn KeyValueStore>,
    backend_name: &'static str,
    users_table: String,
    email_index_table: String,
    read_timeout: Duration,
    write_timeout: Duration,
}

/// Index entry as stored, plus the raw value for conditional writes
struct ResolvedEmail {
    raw: String,
    item: EmailIndexItem,
}

impl KeyValueUserRepository {
    /// Wrap `store`, creating the two tables when they are missing.
    ///
    /// Safe to call against an already provisioned store; existing items are
    /// left alone.
    pub async fn open(
        store: Arc<dyn KeyValueStore>,
        config: &KeyValueConfig,
    ) -> Result<Self, RepositoryError> {
        let repository = Self {
            store,
            backend_name: match config.backend {
                KeyValueBackend::Memory => "memory",
                KeyValueBackend::Redis { .. } => "redis",
            },
            users_table: config.users_table.clone(),
            email_index_table: config.email_index_table.clone(),
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
        };

        for description in [
            users_table_description(&repository.users_table),
            email_index_table_description(&repository.email_index_table),
        ] {
            let name = description.name.clone();
            with_timeout(repository.write_timeout, repository.ensure_table(description))
                .await
                .map_err(|e| RepositoryError::new(Operation::Provision, name, e).log())?;
        }

        Ok(repository)
    }

    async fn ensure_table(&self, description: TableDescription) -> Result<(), UserError> {
        if let Some(existing) = self.store.describe_table(&description.name).await? {
            return check_key_schema(&existing, &description);
        }

        match self.store.create_table(&description).await {
            Ok(()) => {
                tracing::info!(table = %description.name, "Created table");
                Ok(())
            }
            Err(StorageError::TableExists(_)) => {
                // Another instance won the race; its table still has to match
                match self.store.describe_table(&description.name).await? {
                    Some(existing) => check_key_schema(&existing, &description),
                    None => Err(UserError::Storage(format!(
                        "Table {} vanished during provisioning",
                        description.name
                    ))),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn read_user(&self, public_key: &[u8]) -> Result<Option<User>, UserError> {
        let value = self
            .store
            .get_item(&self.users_table, &user_key(public_key))
            .await?;

        match value {
            Some(v) => {
                let item: UserItem = serde_json::from_str(&v)?;
                Ok(Some(User::try_from(item)?))
            }
            None => Ok(None),
        }
    }

    async fn resolve_email(&self, email: &str) -> Result<Option<ResolvedEmail>, UserError> {
        let Some(raw) = self.store.get_item(&self.email_index_table, email).await? else {
            return Ok(None);
        };

        let item: EmailIndexItem = serde_json::from_str(&raw)?;
        if item.email != email {
            return Err(UserError::Inconsistent(format!(
                "Email index entry for {email} names {}",
                item.email
            )));
        }
        Ok(Some(ResolvedEmail { raw, item }))
    }

    async fn lookup_by_email(&self, email: &str) -> Result<User, UserError> {
        let Some(resolved) = self.resolve_email(email).await? else {
            tracing::info!(found = false, "User lookup completed - not found");
            return Err(UserError::NotFound);
        };

        let public_key = &resolved.item.public_key;
        match self.read_user(public_key).await? {
            Some(user) if user.email == email => {
                tracing::info!(found = true, "User lookup completed");
                Ok(user)
            }
            Some(user) => Err(UserError::Inconsistent(format!(
                "Email index entry for {email} points at the user {}",
                user.email
            ))),
            None => {
                tracing::error!(
                    key = %fingerprint(public_key),
                    "Email index entry without a user"
                );
                Err(UserError::NotFound)
            }
        }
    }

    async fn insert(&self, user: NewUser) -> Result<User, UserError> {
        user.validate()?;

        if self
            .store
            .get_item(&self.email_index_table, &user.email)
            .await?
            .is_some()
        {
            return Err(UserError::AlreadyExists(user.email));
        }

        let user = user.into_user(now_micros());
        let public_key = user.public_key.to_spki_der();
        let index_item = EmailIndexItem {
            email: user.email.clone(),
            public_key: public_key.clone(),
        };

        // The absent conditions make the write safe against a concurrent create
        // that passed the probe above
        let ops = vec![
            WriteOp::Put {
                table: self.email_index_table.clone(),
                key: user.email.clone(),
                value: serde_json::to_string(&index_item)?,
                condition: Condition::Absent,
            },
            WriteOp::Put {
                table: self.users_table.clone(),
                key: user_key(&public_key),
                value: serde_json::to_string(&UserItem::from(&user))?,
                condition: Condition::Absent,
            },
        ];

        match self.store.transact_write(ops).await {
            Ok(()) => Ok(user),
            Err(StorageError::ConditionFailed { index: 0 }) => {
                Err(UserError::AlreadyExists(user.email))
            }
            Err(StorageError::ConditionFailed { .. }) => Err(UserError::AlreadyExists(format!(
                "public key {} is already registered",
                user.public_key.fingerprint()
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, email: &str) -> Result<(), UserError> {
        let Some(resolved) = self.resolve_email(email).await? else {
            return Err(UserError::NotFound);
        };

        let users_key = user_key(&resolved.item.public_key);
        let index_delete = WriteOp::Delete {
            table: self.email_index_table.clone(),
            key: email.to_string(),
            condition: Condition::Equals(resolved.raw),
        };

        let Some(user_raw) = self.store.get_item(&self.users_table, &users_key).await? else {
            tracing::error!(
                key = %fingerprint(&resolved.item.public_key),
                "Removing email index entry without a user"
            );
            return match self.store.transact_write(vec![index_delete]).await {
                Ok(()) | Err(StorageError::ConditionFailed { .. }) => Err(UserError::NotFound),
                Err(e) => Err(e.into()),
            };
        };

        let owner: UserItem = serde_json::from_str(&user_raw)?;
        if owner.email != email {
            return Err(UserError::Inconsistent(format!(
                "Email index entry for {email} points at the user {}",
                owner.email
            )));
        }

        // Both items must still be exactly as read
        let ops = vec![
            index_delete,
            WriteOp::Delete {
                table: self.users_table.clone(),
                key: users_key,
                condition: Condition::Equals(user_raw),
            },
        ];

        match self.store.transact_write(ops).await {
            Ok(()) => Ok(()),
            // A concurrent delete got there first
            Err(StorageError::ConditionFailed { .. }) => Err(UserError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

fn check_key_schema(
    existing: &TableDescription,
    expected: &TableDescription,
) -> Result<(), UserError> {
    if existing.key_attribute == expected.key_attribute && existing.key_type == expected.key_type {
        return Ok(());
    }

    Err(StorageError::SchemaMismatch(format!(
        "table {} is keyed by {} ({:?}), expected {} ({:?})",
        existing.name,
        existing.key_attribute,
        existing.key_type,
        expected.key_attribute,
        expected.key_type
    ))
    .into())
}

#[async_trait]
impl UserRepository for KeyValueUserRepository {
    #[tracing::instrument(skip(self, public_key), fields(key = %fingerprint(public_key)))]
    async fn get_by_pk(&self, public_key: &[u8]) -> Result<User, RepositoryError> {
        let result = with_timeout(self.read_timeout, self.read_user(public_key)).await;

        let result = match result {
            Ok(Some(user)) => {
                tracing::info!(found = true, "User lookup completed");
                Ok(user)
            }
            Ok(None) => {
                tracing::info!(found = false, "User lookup completed - not found");
                Err(UserError::NotFound)
            }
            Err(e) => Err(e),
        };

        result.map_err(|e| {
            RepositoryError::new(Operation::GetByPk, fingerprint(public_key), e).log()
        })
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_email(&self, email: &str) -> Result<User, RepositoryError> {
        with_timeout(self.write_timeout, self.lookup_by_email(email))
            .await
            .map_err(|e| RepositoryError::new(Operation::GetByEmail, email, e).log())
    }

    #[tracing::instrument(skip(self, user), fields(email = %user.email))]
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let email = user.email.clone();

        match with_timeout(self.write_timeout, self.insert(user)).await {
            Ok(user) => {
                tracing::info!(key = %user.public_key.fingerprint(), "User created");
                Ok(user)
            }
            Err(e) => Err(RepositoryError::new(Operation::Create, email, e).log()),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn delete_by_email(&self, email: &str) -> Result<(), RepositoryError> {
        match with_timeout(self.write_timeout, self.remove(email)).await {
            Ok(()) => {
                tracing::info!("User deleted");
                Ok(())
            }
            Err(e) => Err(RepositoryError::new(Operation::DeleteByEmail, email, e).log()),
        }
    }

    fn backend_name(&self) -> &'static str {
        self.backend_name
    }
}
