//! Connection setup for the relational backends

use std::str::FromStr;

use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::config::{RelationalBackend, RelationalConfig};
use crate::storage::errors::StorageError;

use super::types::{DataStore, PostgresDataStore, SqliteDataStore};

/// Build a lazily connecting pool for the configured backend
pub(crate) fn connect_data_store(
    config: &RelationalConfig,
) -> Result<Box<dyn DataStore>, StorageError> {
    tracing::info!(
        "Initializing data store with type: {}, url: {}",
        config.backend,
        redact_credentials(&config.url)
    );

    if config.max_connections == 0 {
        return Err(StorageError::Storage(
            "Connection pool needs at least one connection".to_string(),
        ));
    }

    let store: Box<dyn DataStore> = match config.backend {
        RelationalBackend::Sqlite => {
            let opts = SqliteConnectOptions::from_str(&config.url)
                .map_err(|e| {
                    StorageError::Storage(format!("Failed to parse SQLite connection string: {e}"))
                })?
                .create_if_missing(true);

            Box::new(SqliteDataStore {
                pool: SqlitePoolOptions::new()
                    .max_connections(config.max_connections)
                    .connect_lazy_with(opts),
            })
        }
        RelationalBackend::Postgres => Box::new(PostgresDataStore {
            pool: PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect_lazy(&config.url)
                .map_err(|e| {
                    StorageError::Storage(format!("Failed to create Postgres pool: {e}"))
                })?,
        }),
    };

    Ok(store)
}

/// Connection URL with any `user:password@` part masked, for logging
fn redact_credentials(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{scheme}://***@{}", &rest[at + 1..]),
        None => url.to_string(),
    }
}
