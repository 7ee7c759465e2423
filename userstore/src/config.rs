//! Store selection and tuning, read once at startup

use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_TABLE_PREFIX: &str = "us_";
const DEFAULT_KEY_PREFIX: &str = "userstore";
const DEFAULT_SQLITE_URL: &str = "sqlite:userstore.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(String),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationalBackend {
    Sqlite,
    Postgres,
}

impl fmt::Display for RelationalBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => f.write_str("sqlite"),
            Self::Postgres => f.write_str("postgres"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationalConfig {
    pub backend: RelationalBackend,
    pub url: String,
    /// Prepended to the `users` table name
    pub table_prefix: String,
    pub max_connections: u32,
    pub query_timeout: Duration,
}

impl RelationalConfig {
    pub fn new(backend: RelationalBackend, url: impl Into<String>) -> Self {
        Self {
            backend,
            url: url.into(),
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn table_name(&self) -> String {
        format!("{}users", self.table_prefix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyValueBackend {
    Memory,
    Redis { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValueConfig {
    pub backend: KeyValueBackend,
    /// Namespace for every key the engine writes
    pub key_prefix: String,
    pub users_table: String,
    pub email_index_table: String,
    /// Bound on single-item reads
    pub read_timeout: Duration,
    /// Bound on flows that read before writing or read twice
    pub write_timeout: Duration,
}

impl KeyValueConfig {
    pub fn new(backend: KeyValueBackend, table_prefix: &str) -> Self {
        Self {
            backend,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            users_table: format!("{table_prefix}users"),
            email_index_table: format!("{table_prefix}email_index"),
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

/// Which repository to build, and how
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Relational(RelationalConfig),
    KeyValue(KeyValueConfig),
}

impl StoreConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Read the configuration through `lookup`, which returns `None` for unset variables
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_type = lookup("USER_STORE_TYPE")
            .ok_or_else(|| ConfigError::Missing("USER_STORE_TYPE".to_string()))?;
        let table_prefix =
            lookup("USER_TABLE_PREFIX").unwrap_or_else(|| DEFAULT_TABLE_PREFIX.to_string());
        let url = lookup("USER_STORE_URL").filter(|url| !url.is_empty());

        let config = match store_type.to_lowercase().as_str() {
            "sqlite" | "postgres" => {
                let backend = if store_type.eq_ignore_ascii_case("sqlite") {
                    RelationalBackend::Sqlite
                } else {
                    RelationalBackend::Postgres
                };
                let url = match (backend, url) {
                    (_, Some(url)) => url,
                    (RelationalBackend::Sqlite, None) => DEFAULT_SQLITE_URL.to_string(),
                    (RelationalBackend::Postgres, None) => {
                        return Err(ConfigError::Missing("USER_STORE_URL".to_string()));
                    }
                };

                Self::Relational(RelationalConfig {
                    backend,
                    url,
                    table_prefix,
                    max_connections: connections_or(&lookup, DEFAULT_MAX_CONNECTIONS)?,
                    query_timeout: millis_or(
                        &lookup,
                        "USER_STORE_QUERY_TIMEOUT_MS",
                        DEFAULT_QUERY_TIMEOUT,
                    )?,
                })
            }
            "redis" | "memory" => {
                let backend = if store_type.eq_ignore_ascii_case("memory") {
                    KeyValueBackend::Memory
                } else {
                    KeyValueBackend::Redis {
                        url: url.ok_or_else(|| ConfigError::Missing("USER_STORE_URL".to_string()))?,
                    }
                };

                let mut config = KeyValueConfig::new(backend, &table_prefix);
                if let Some(key_prefix) = lookup("USER_STORE_KEY_PREFIX") {
                    config.key_prefix = key_prefix;
                }
                config.read_timeout =
                    millis_or(&lookup, "USER_STORE_READ_TIMEOUT_MS", DEFAULT_READ_TIMEOUT)?;
                config.write_timeout =
                    millis_or(&lookup, "USER_STORE_WRITE_TIMEOUT_MS", DEFAULT_WRITE_TIMEOUT)?;

                Self::KeyValue(config)
            }
            other => {
                return Err(ConfigError::Invalid {
                    var: "USER_STORE_TYPE".to_string(),
                    reason: format!(
                        "unknown store type '{other}', expected sqlite, postgres, redis or memory"
                    ),
                });
            }
        };

        Ok(config)
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Relational(config) => match config.backend {
                RelationalBackend::Sqlite => "sqlite",
                RelationalBackend::Postgres => "postgres",
            },
            Self::KeyValue(config) => match config.backend {
                KeyValueBackend::Memory => "memory",
                KeyValueBackend::Redis { .. } => "redis",
            },
        }
    }
}

fn parse_or<F, T>(lookup: &F, var: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: var.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn connections_or<F>(lookup: &F, default: u32) -> Result<u32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = "USER_STORE_MAX_CONNECTIONS";
    let connections: u32 = parse_or(lookup, var, default)?;
    if connections == 0 {
        return Err(ConfigError::Invalid {
            var: var.to_string(),
            reason: "pool needs at least one connection".to_string(),
        });
    }
    Ok(connections)
}

fn millis_or<F>(lookup: &F, var: &str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let millis: u64 = parse_or(lookup, var, default.as_millis() as u64)?;
    if millis == 0 {
        return Err(ConfigError::Invalid {
            var: var.to_string(),
            reason: "timeout must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_millis(millis))
}
