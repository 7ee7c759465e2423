mod memory;
mod redis;
mod types;

pub use memory::InMemoryKeyValueStore;
pub use redis::RedisKeyValueStore;
pub use types::{Condition, KeyType, KeyValueStore, TableDescription, WriteOp};
