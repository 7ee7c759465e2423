use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use userstore::{
    KeyValueBackend, KeyValueConfig, RelationalBackend, RelationalConfig, StoreConfig,
    UserRepository, open_repository,
};

static NEXT_PREFIX: AtomicUsize = AtomicUsize::new(0);

/// A repository under test, labelled for assertion messages
pub struct Backend {
    pub name: &'static str,
    pub repository: Arc<dyn UserRepository>,
}

/// Table prefix that no other test in this run, or earlier run, uses
fn table_prefix() -> String {
    let n = NEXT_PREFIX.fetch_add(1, Ordering::Relaxed);
    let nanos = chrono::Utc::now().timestamp_subsec_nanos();
    format!("it_{}_{n}_{nanos}_", std::process::id())
}

fn env_url(var: &str) -> Option<String> {
    let _ = dotenvy::dotenv();
    std::env::var(var).ok().filter(|url| !url.is_empty())
}

async fn open(name: &'static str, config: StoreConfig) -> Backend {
    let repository = open_repository(&config)
        .await
        .unwrap_or_else(|e| panic!("failed to open {name} repository: {e:?}"));
    Backend { name, repository }
}

/// Fresh, empty repositories for every backend available to this run
pub async fn backends() -> Vec<Backend> {
    let mut sqlite = RelationalConfig::new(RelationalBackend::Sqlite, "sqlite::memory:");
    sqlite.max_connections = 1;
    sqlite.table_prefix = table_prefix();

    let mut backends = vec![
        open("sqlite", StoreConfig::Relational(sqlite)).await,
        open(
            "memory",
            StoreConfig::KeyValue(KeyValueConfig::new(KeyValueBackend::Memory, &table_prefix())),
        )
        .await,
    ];

    if let Some(url) = env_url("USERSTORE_TEST_POSTGRES_URL") {
        let mut postgres = RelationalConfig::new(RelationalBackend::Postgres, url);
        postgres.table_prefix = table_prefix();
        backends.push(open("postgres", StoreConfig::Relational(postgres)).await);
    }

    if let Some(url) = env_url("USERSTORE_TEST_REDIS_URL") {
        let mut redis = KeyValueConfig::new(KeyValueBackend::Redis { url }, &table_prefix());
        redis.key_prefix = "userstore-it".to_string();
        backends.push(open("redis", StoreConfig::KeyValue(redis)).await);
    }

    backends
}
