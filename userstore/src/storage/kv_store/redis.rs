use std::sync::LazyLock;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Script};

use crate::storage::errors::StorageError;

use super::types::{Condition, KeyValueStore, TableDescription, WriteOp};

const TABLES_NAMESPACE: &str = "__tables__";

// KEYS come in pairs per operation: the item key, then its table's metadata key.
// ARGV carries four entries per operation: kind, condition, expected value, new value.
// Returns 0 on success, i when the condition of operation i fails and -i when
// the table of operation i does not exist (1-based). Nothing is written unless
// every check passes.
static TRANSACT_WRITE_SCRIPT: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
local n = #KEYS / 2
for i = 1, n do
  local item = KEYS[2 * i - 1]
  local base = (i - 1) * 4
  if redis.call('EXISTS', KEYS[2 * i]) == 0 then
    return -i
  end
  local cond = ARGV[base + 2]
  local current = redis.call('GET', item)
  if cond == 'absent' then
    if current then return i end
  elseif cond == 'exists' then
    if not current then return i end
  elseif cond == 'equals' then
    if current ~= ARGV[base + 3] then return i end
  end
end
for i = 1, n do
  local item = KEYS[2 * i - 1]
  local base = (i - 1) * 4
  if ARGV[base + 1] == 'put' then
    redis.call('SET', item, ARGV[base + 4])
  else
    redis.call('DEL', item)
  end
end
return 0
",
    )
});

/// Key-value engine on top of Redis.
///
/// Items live under `{prefix}:{table}:{key}` and each table's description
/// under `{prefix}:__tables__:{table}`. Transactions run as a single Lua script
/// so that the condition checks and the writes are atomic.
#[derive(Clone)]
pub struct RedisKeyValueStore {
    conn: MultiplexedConnection,
    prefix: String,
}

impl RedisKeyValueStore {
    pub async fn connect(url: &str, prefix: &str) -> Result<Self, StorageError> {
        tracing::info!("Connecting to Redis key-value store with prefix '{prefix}'");

        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;

        Ok(Self {
            conn,
            prefix: prefix.to_string(),
        })
    }
}

impl std::fmt::Debug for RedisKeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisKeyValueStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

fn item_key(prefix: &str, table: &str, key: &str) -> String {
    format!("{prefix}:{table}:{key}")
}

fn table_key(prefix: &str, table: &str) -> String {
    format!("{prefix}:{TABLES_NAMESPACE}:{table}")
}

/// Script arguments for one operation, in ARGV order
fn script_args(op: &WriteOp) -> [&str; 4] {
    let (kind, value) = match op {
        WriteOp::Put { value, .. } => ("put", value.as_str()),
        WriteOp::Delete { .. } => ("del", ""),
    };
    let (condition, expected) = match op.condition() {
        Condition::None => ("none", ""),
        Condition::Absent => ("absent", ""),
        Condition::Exists => ("exists", ""),
        Condition::Equals(expected) => ("equals", expected.as_str()),
    };
    [kind, condition, expected, value]
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn describe_table(
        &self,
        table: &str,
    ) -> Result<Option<TableDescription>, StorageError> {
        let mut conn = self.conn.clone();

        let value: Option<String> = conn.get(table_key(&self.prefix, table)).await?;

        match value {
            Some(v) => Ok(Some(serde_json::from_str(&v)?)),
            None => Ok(None),
        }
    }

    async fn create_table(&self, description: &TableDescription) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();

        let value = serde_json::to_string(description)?;
        let created: bool = conn
            .set_nx(table_key(&self.prefix, &description.name), value)
            .await?;

        if created {
            Ok(())
        } else {
            Err(StorageError::TableExists(description.name.clone()))
        }
    }

    async fn get_item(&self, table: &str, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.conn.clone();

        let (table_exists, value): (bool, Option<String>) = redis::pipe()
            .atomic()
            .exists(table_key(&self.prefix, table))
            .get(item_key(&self.prefix, table, key))
            .query_async(&mut conn)
            .await?;

        if !table_exists {
            return Err(StorageError::TableNotFound(table.to_string()));
        }
        Ok(value)
    }

    async fn transact_write(&self, ops: Vec<WriteOp>) -> Result<(), StorageError> {
        if ops.is_empty() {
            return Ok(());
        }

        let mut invocation = TRANSACT_WRITE_SCRIPT.prepare_invoke();
        for op in &ops {
            invocation
                .key(item_key(&self.prefix, op.table(), op.key()))
                .key(table_key(&self.prefix, op.table()));
            for arg in script_args(op) {
                invocation.arg(arg);
            }
        }

        let mut conn = self.conn.clone();
        let outcome: i64 = invocation.invoke_async(&mut conn).await?;

        match outcome {
            0 => Ok(()),
            i if i > 0 => Err(StorageError::ConditionFailed {
                index: (i - 1) as usize,
            }),
            i => {
                let table = ops
                    .get((-i - 1) as usize)
                    .map(|op| op.table().to_string())
                    .unwrap_or_default();
                Err(StorageError::TableNotFound(table))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv_store::types::KeyType;
    use serial_test::serial;

    #[test]
    fn test_item_and_table_keys() {
        assert_eq!(item_key("us", "users", "abc"), "us:users:abc");
        assert_eq!(table_key("us", "users"), "us:__tables__:users");
    }

    #[test]
    fn test_script_args_for_put() {
        let op = WriteOp::Put {
            table: "t".to_string(),
            key: "k".to_string(),
            value: "{\"a\":1}".to_string(),
            condition: Condition::Absent,
        };

        assert_eq!(script_args(&op), ["put", "absent", "", "{\"a\":1}"]);
    }

    #[test]
    fn test_script_args_for_conditional_delete() {
        let op = WriteOp::Delete {
            table: "t".to_string(),
            key: "k".to_string(),
            condition: Condition::Equals("old".to_string()),
        };

        assert_eq!(script_args(&op), ["del", "equals", "old", ""]);
    }

    // Runs only when a Redis server is provided through the environment
    #[tokio::test]
    #[serial]
    async fn test_redis_transaction_roundtrip() {
        let _ = dotenvy::dotenv();
        let Ok(url) = std::env::var("USERSTORE_TEST_REDIS_URL") else {
            return;
        };

        let prefix = format!("userstore-unit-{}", std::process::id());
        let store = RedisKeyValueStore::connect(&url, &prefix)
            .await
            .expect("redis connection");
        let description = TableDescription {
            name: "items".to_string(),
            key_attribute: "id".to_string(),
            key_type: KeyType::String,
        };

        // Given a fresh table
        store.create_table(&description).await.expect("create table");
        assert_eq!(
            store.create_table(&description).await,
            Err(StorageError::TableExists("items".to_string()))
        );
        assert_eq!(
            store.describe_table("items").await,
            Ok(Some(description.clone()))
        );

        // When writing with an absent condition twice
        let put = WriteOp::Put {
            table: "items".to_string(),
            key: "k".to_string(),
            value: "v".to_string(),
            condition: Condition::Absent,
        };
        store.transact_write(vec![put.clone()]).await.expect("first put");
        let second = store.transact_write(vec![put]).await;

        // Then the second is cancelled
        assert_eq!(second, Err(StorageError::ConditionFailed { index: 0 }));
        assert_eq!(store.get_item("items", "k").await, Ok(Some("v".to_string())));
        assert_eq!(
            store.get_item("missing", "k").await,
            Err(StorageError::TableNotFound("missing".to_string()))
        );

        // Cleanup
        store
            .transact_write(vec![WriteOp::Delete {
                table: "items".to_string(),
                key: "k".to_string(),
                condition: Condition::Exists,
            }])
            .await
            .expect("cleanup item");
        let mut conn = store.conn.clone();
        let _: () = conn
            .del(table_key(&prefix, "items"))
            .await
            .expect("cleanup table");
    }
}
