use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::storage::errors::StorageError;

/// Type of a table's key attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyType {
    String,
    Binary,
}

/// Key schema of a table, as created and as reported by `describe_table`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescription {
    pub name: String,
    pub key_attribute: String,
    pub key_type: KeyType,
}

/// Precondition attached to one operation of a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    None,
    /// The item must not exist
    Absent,
    /// The item must exist
    Exists,
    /// The item must exist and hold exactly this value
    Equals(String),
}

impl Condition {
    /// Whether the condition holds for the item's current value
    pub fn is_met(&self, current: Option<&str>) -> bool {
        match self {
            Self::None => true,
            Self::Absent => current.is_none(),
            Self::Exists => current.is_some(),
            Self::Equals(expected) => current == Some(expected.as_str()),
        }
    }
}

/// One item mutation inside `KeyValueStore::transact_write`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Put {
        table: String,
        key: String,
        value: String,
        condition: Condition,
    },
    Delete {
        table: String,
        key: String,
        condition: Condition,
    },
}

impl WriteOp {
    pub fn table(&self) -> &str {
        match self {
            Self::Put { table, .. } | Self::Delete { table, .. } => table,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Put { key, .. } | Self::Delete { key, .. } => key,
        }
    }

    pub fn condition(&self) -> &Condition {
        match self {
            Self::Put { condition, .. } | Self::Delete { condition, .. } => condition,
        }
    }
}

/// Item-level operations of a key-value engine.
///
/// Items are opaque strings addressed by `(table, key)`. Reading a missing item
/// is not an error. `transact_write` applies every operation or none of them;
/// when a condition does not hold the whole transaction is cancelled with
/// `StorageError::ConditionFailed` naming the first failing operation.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Look up a table's key schema. `None` when the table does not exist.
    async fn describe_table(&self, table: &str)
    -> Result<Option<TableDescription>, StorageError>;

    /// Create a table. Fails with `StorageError::TableExists` if it is already there.
    async fn create_table(&self, description: &TableDescription) -> Result<(), StorageError>;

    async fn get_item(&self, table: &str, key: &str) -> Result<Option<String>, StorageError>;

    async fn transact_write(&self, ops: Vec<WriteOp>) -> Result<(), StorageError>;
}
