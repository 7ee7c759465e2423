//! Email index bookkeeping of the key-value adapter, observed at the engine level

use std::sync::Arc;

use userstore::{
    EcCurve, InMemoryKeyValueStore, KeyValueBackend, KeyValueConfig, KeyValueStore,
    KeyValueUserRepository, RedisKeyValueStore, UserRepository, base64url_encode,
};

use crate::common::{generate_public_key, new_user, unique_email};

struct Engine {
    name: &'static str,
    store: Arc<dyn KeyValueStore>,
    config: KeyValueConfig,
}

async fn engines() -> Vec<Engine> {
    let prefix = format!("kv_{}_", std::process::id());
    let mut engines = vec![Engine {
        name: "memory",
        store: Arc::new(InMemoryKeyValueStore::new()),
        config: KeyValueConfig::new(KeyValueBackend::Memory, &prefix),
    }];

    let _ = dotenvy::dotenv();
    if let Ok(url) = std::env::var("USERSTORE_TEST_REDIS_URL") {
        let config = KeyValueConfig::new(KeyValueBackend::Redis { url: url.clone() }, &prefix);
        let store = RedisKeyValueStore::connect(&url, "userstore-it")
            .await
            .expect("redis connection");
        engines.push(Engine {
            name: "redis",
            store: Arc::new(store),
            config,
        });
    }

    engines
}

#[tokio::test]
async fn test_provisioning_is_idempotent_and_keeps_data() {
    for engine in engines().await {
        let name = engine.name;

        // Given a provisioned store holding a user
        let first = KeyValueUserRepository::open(engine.store.clone(), &engine.config)
            .await
            .unwrap_or_else(|e| panic!("[{name}] first open failed: {e:?}"));
        let email = unique_email("provision");
        let created = first
            .create(new_user(&email, "Kept", generate_public_key(EcCurve::P256)))
            .await
            .expect("created");

        // When provisioning the same store again
        let second = KeyValueUserRepository::open(engine.store.clone(), &engine.config)
            .await
            .unwrap_or_else(|e| panic!("[{name}] second open failed: {e:?}"));

        // Then the existing user is untouched
        assert_eq!(second.get_by_email(&email).await, Ok(created), "[{name}]");
    }
}

#[tokio::test]
async fn test_create_and_delete_keep_both_tables_in_step() {
    for engine in engines().await {
        let name = engine.name;
        let config = &engine.config;
        let repository = KeyValueUserRepository::open(engine.store.clone(), config)
            .await
            .expect("open");
        let email = unique_email("step");
        let spki = generate_public_key(EcCurve::P384).to_spki_der();
        let users_key = base64url_encode(&spki);

        // Given a created user
        let key = userstore::PublicKey::from_spki_der(&spki).expect("valid key");
        repository
            .create(new_user(&email, "Step", key))
            .await
            .expect("created");

        // Then both the user item and the index item exist
        let index = engine
            .store
            .get_item(&config.email_index_table, &email)
            .await
            .expect("index read");
        let user = engine
            .store
            .get_item(&config.users_table, &users_key)
            .await
            .expect("user read");
        assert!(index.is_some(), "[{name}] index entry missing");
        assert!(user.is_some(), "[{name}] user item missing");

        // When a duplicate create fails
        let err = repository
            .create(new_user(&email, "Dup", generate_public_key(EcCurve::P256)))
            .await
            .expect_err("duplicate");
        assert!(err.is_already_exists(), "[{name}]");

        // Then the index still points at the original key
        assert_eq!(
            engine
                .store
                .get_item(&config.email_index_table, &email)
                .await
                .expect("index read"),
            index,
            "[{name}]"
        );

        // And after deleting, both items are gone
        repository.delete_by_email(&email).await.expect("deleted");
        assert_eq!(
            engine
                .store
                .get_item(&config.email_index_table, &email)
                .await
                .expect("index read"),
            None,
            "[{name}]"
        );
        assert_eq!(
            engine
                .store
                .get_item(&config.users_table, &users_key)
                .await
                .expect("user read"),
            None,
            "[{name}]"
        );
    }
}
