//! Storage engine plumbing shared by the user repositories

mod data_store;
mod errors;
mod kv_store;
mod schema_validation;

pub(crate) use data_store::{DataStore, connect_data_store};
pub use errors::StorageError;
pub use kv_store::{
    Condition, InMemoryKeyValueStore, KeyType, KeyValueStore, RedisKeyValueStore,
    TableDescription, WriteOp,
};
pub(crate) use schema_validation::{validate_postgres_table_schema, validate_sqlite_table_schema};
