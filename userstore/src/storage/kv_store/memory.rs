use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::storage::errors::StorageError;

use super::types::{KeyValueStore, TableDescription, WriteOp};

#[derive(Debug)]
struct Table {
    description: TableDescription,
    items: HashMap<String, String>,
}

/// Process-local key-value engine.
///
/// All tables sit behind one lock, which makes every transaction trivially
/// atomic. Used for tests and single-instance deployments.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    tables: Mutex<HashMap<String, Table>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory key-value store");
        Self::default()
    }
}

fn missing_table(table: &str) -> StorageError {
    StorageError::TableNotFound(table.to_string())
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn describe_table(
        &self,
        table: &str,
    ) -> Result<Option<TableDescription>, StorageError> {
        let tables = self.tables.lock().await;
        Ok(tables.get(table).map(|t| t.description.clone()))
    }

    async fn create_table(&self, description: &TableDescription) -> Result<(), StorageError> {
        let mut tables = self.tables.lock().await;
        if tables.contains_key(&description.name) {
            return Err(StorageError::TableExists(description.name.clone()));
        }

        tables.insert(
            description.name.clone(),
            Table {
                description: description.clone(),
                items: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn get_item(&self, table: &str, key: &str) -> Result<Option<String>, StorageError> {
        let tables = self.tables.lock().await;
        let table = tables.get(table).ok_or_else(|| missing_table(table))?;
        Ok(table.items.get(key).cloned())
    }

    async fn transact_write(&self, ops: Vec<WriteOp>) -> Result<(), StorageError> {
        let mut tables = self.tables.lock().await;

        // Check every condition before touching anything
        for (index, op) in ops.iter().enumerate() {
            let table = tables
                .get(op.table())
                .ok_or_else(|| missing_table(op.table()))?;
            let current = table.items.get(op.key()).map(String::as_str);
            if !op.condition().is_met(current) {
                return Err(StorageError::ConditionFailed { index });
            }
        }

        for op in ops {
            match op {
                WriteOp::Put {
                    table, key, value, ..
                } => {
                    let table = tables
                        .get_mut(&table)
                        .ok_or_else(|| missing_table(&table))?;
                    table.items.insert(key, value);
                }
                WriteOp::Delete { table, key, .. } => {
                    let table = tables
                        .get_mut(&table)
                        .ok_or_else(|| missing_table(&table))?;
                    table.items.remove(&key);
                }
            }
        }

        Ok(())
    }
}
