//! Repository behaviour every backend must share

use std::error::Error as _;

use userstore::{EcCurve, Operation, UserError};

use crate::common::{assert_recent, backends, generate_public_key, new_user, unique_email};

#[tokio::test]
async fn test_create_get_delete_lifecycle() {
    for backend in backends().await {
        let repository = &backend.repository;
        let name = backend.name;
        let email = unique_email("jon.doe");
        let key = generate_public_key(EcCurve::P256);

        // Given a created user
        let created = repository
            .create(new_user(&email, "Jon Doe", key.clone()))
            .await
            .unwrap_or_else(|e| panic!("[{name}] create failed: {e:?}"));

        // Then it carries the input and fresh, equal timestamps
        assert_eq!(created.email, email, "[{name}]");
        assert_eq!(created.name, "Jon Doe", "[{name}]");
        assert_eq!(created.public_key, key, "[{name}]");
        assert_eq!(created.wrapped_private_key, b"B1: wrapped private key", "[{name}]");
        assert_eq!(created.wrapped_master_key, b"B2: wrapped master key", "[{name}]");
        assert_eq!(created.updated_at, created.created_at, "[{name}]");
        assert_recent(created.created_at);

        // When reading it back by email
        let found = repository
            .get_by_email(&email)
            .await
            .unwrap_or_else(|e| panic!("[{name}] get_by_email failed: {e:?}"));

        // Then the stored user is identical, timestamps included
        assert_eq!(found, created, "[{name}]");

        // And deleting it succeeds
        repository
            .delete_by_email(&email)
            .await
            .unwrap_or_else(|e| panic!("[{name}] delete failed: {e:?}"));

        // And it is gone
        let err = repository
            .get_by_email(&email)
            .await
            .expect_err("deleted user must not be found");
        assert!(err.is_not_found(), "[{name}] expected NotFound, got {err:?}");
    }
}

#[tokio::test]
async fn test_duplicate_email_is_rejected_without_changes() {
    for backend in backends().await {
        let repository = &backend.repository;
        let name = backend.name;
        let email = unique_email("dup");

        // Given a user
        let first = repository
            .create(new_user(&email, "First", generate_public_key(EcCurve::P256)))
            .await
            .unwrap_or_else(|e| panic!("[{name}] first create failed: {e:?}"));

        // When creating another user with the same email and a different key
        let second_key = generate_public_key(EcCurve::P256);
        let err = repository
            .create(new_user(&email, "Second", second_key.clone()))
            .await
            .expect_err("duplicate email must fail");

        // Then it fails with AlreadyExists
        assert!(err.is_already_exists(), "[{name}] got {err:?}");
        assert_eq!(err.operation(), Operation::Create, "[{name}]");

        // And the first user is unchanged
        assert_eq!(repository.get_by_email(&email).await, Ok(first), "[{name}]");

        // And the second key was never stored
        let err = repository
            .get_by_pk(&second_key.to_spki_der())
            .await
            .expect_err("second key must not exist");
        assert!(err.is_not_found(), "[{name}] got {err:?}");
    }
}

#[tokio::test]
async fn test_get_by_pk_for_unknown_key_is_not_found() {
    for backend in backends().await {
        let name = backend.name;
        let never_stored = generate_public_key(EcCurve::P256).to_spki_der();

        let err = backend
            .repository
            .get_by_pk(&never_stored)
            .await
            .expect_err("unknown key");

        assert!(err.is_not_found(), "[{name}] got {err:?}");
        assert_eq!(err.operation(), Operation::GetByPk, "[{name}]");
    }
}

#[tokio::test]
async fn test_get_by_email_for_unknown_email_is_not_found() {
    for backend in backends().await {
        let name = backend.name;

        let err = backend
            .repository
            .get_by_email(&unique_email("nobody"))
            .await
            .expect_err("unknown email");

        assert!(err.is_not_found(), "[{name}] got {err:?}");
    }
}

#[tokio::test]
async fn test_email_and_key_lookups_agree() {
    for backend in backends().await {
        let repository = &backend.repository;
        let name = backend.name;

        for curve in [EcCurve::P256, EcCurve::P384] {
            // Given a created user
            let email = unique_email("lookup");
            let created = repository
                .create(new_user(&email, "Lookup", generate_public_key(curve)))
                .await
                .unwrap_or_else(|e| panic!("[{name}] create failed: {e:?}"));

            // When resolving by email, then by the resolved key
            let by_email = repository.get_by_email(&email).await.expect("by email");
            let by_pk = repository
                .get_by_pk(&by_email.public_key.to_spki_der())
                .await
                .expect("by key");

            // Then both return the identical user
            assert_eq!(by_email, created, "[{name}] {curve}");
            assert_eq!(by_pk, created, "[{name}] {curve}");
        }
    }
}

#[tokio::test]
async fn test_delete_removes_key_lookup_too() {
    for backend in backends().await {
        let repository = &backend.repository;
        let name = backend.name;
        let email = unique_email("gone");
        let spki = generate_public_key(EcCurve::P256).to_spki_der();

        // Given a user that has been deleted
        let key = userstore::PublicKey::from_spki_der(&spki).expect("valid key");
        repository
            .create(new_user(&email, "Gone", key))
            .await
            .expect("created");
        repository.delete_by_email(&email).await.expect("deleted");

        // Then neither lookup finds it
        assert!(
            repository
                .get_by_pk(&spki)
                .await
                .expect_err("key gone")
                .is_not_found(),
            "[{name}]"
        );
        assert!(
            repository
                .get_by_email(&email)
                .await
                .expect_err("email gone")
                .is_not_found(),
            "[{name}]"
        );

        // And the email can be registered again
        repository
            .create(new_user(&email, "Back", generate_public_key(EcCurve::P256)))
            .await
            .unwrap_or_else(|e| panic!("[{name}] re-create failed: {e:?}"));
    }
}

#[tokio::test]
async fn test_delete_unknown_email_is_not_found() {
    for backend in backends().await {
        let name = backend.name;

        let err = backend
            .repository
            .delete_by_email(&unique_email("missing"))
            .await
            .expect_err("nothing to delete");

        assert!(err.is_not_found(), "[{name}] got {err:?}");
    }
}

#[tokio::test]
async fn test_invalid_email_is_a_validation_error() {
    for backend in backends().await {
        let name = backend.name;

        let err = backend
            .repository
            .create(new_user("no-at-sign", "Bad", generate_public_key(EcCurve::P256)))
            .await
            .expect_err("invalid email");

        assert!(
            matches!(err.kind(), UserError::InvalidData(_)),
            "[{name}] got {err:?}"
        );
    }
}

#[tokio::test]
async fn test_error_kind_is_reachable_through_source_chain() {
    for backend in backends().await {
        let name = backend.name;
        let email = unique_email("chain");

        let err = backend
            .repository
            .get_by_email(&email)
            .await
            .expect_err("unknown email");

        // The wrapper names the operation and subject; the kind sits underneath
        assert!(err.to_string().contains(&email), "[{name}] {err}");
        let source = err.source().expect("wrapped kind");
        assert_eq!(
            source.downcast_ref::<UserError>(),
            Some(&UserError::NotFound),
            "[{name}]"
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_for_one_email_succeed_once() {
    for backend in backends().await {
        let name = backend.name;
        let email = unique_email("race");

        // Given several creates racing for the same email
        let handles: Vec<_> = (0..6)
            .map(|i| {
                let repository = backend.repository.clone();
                let user = new_user(&email, &format!("Racer {i}"), generate_public_key(EcCurve::P256));
                tokio::spawn(async move { repository.create(user).await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            match handle.await.expect("task finished") {
                Ok(_) => winners += 1,
                Err(err) => assert!(err.is_already_exists(), "[{name}] got {err:?}"),
            }
        }

        // Then exactly one succeeded
        assert_eq!(winners, 1, "[{name}]");
    }
}
