//! The request-level facade on top of each backend

use userstore::{CreateUserRequest, EcCurve, ServiceError, UserService};

use crate::common::{backends, generate_public_key, unique_email};

#[tokio::test]
async fn test_service_roundtrip_on_every_backend() {
    for backend in backends().await {
        let name = backend.name;
        let service = UserService::new(backend.repository.clone());
        let email = unique_email("svc");
        let spki = generate_public_key(EcCurve::P256).to_spki_der();

        // Given a user created through the facade
        let created = service
            .create_user(CreateUserRequest {
                email: email.clone(),
                name: "Jon Doe".to_string(),
                public_key: spki.clone(),
                wrapped_private_key: vec![0xb1],
                wrapped_master_key: vec![0xb2],
            })
            .await
            .unwrap_or_else(|e| panic!("[{name}] create failed: {e:?}"));

        // Then every read path returns the same record
        assert_eq!(service.get_user_by_pk(&spki).await, Ok(created.clone()), "[{name}]");
        assert_eq!(service.get_user_by_email(&email).await, Ok(created.clone()), "[{name}]");
        assert_eq!(
            service
                .get_user_pk_by_email(&email)
                .await
                .map(|response| response.public_key),
            Ok(spki),
            "[{name}]"
        );
        assert_eq!(created.updated_at, created.created_at, "[{name}]");

        // And deletion makes it a NotFound
        service.delete_user_by_email(&email).await.expect("deleted");
        assert!(
            matches!(
                service.get_user_by_email(&email).await,
                Err(ServiceError::NotFound(_))
            ),
            "[{name}]"
        );
    }
}
