use std::sync::Arc;

use crate::keys::PublicKey;
use crate::userdb::{NewUser, UserRepository};

use super::errors::ServiceError;
use super::types::{CreateUserRequest, UserPublicKeyResponse, UserResponse};

/// Request-level operations on top of a repository.
///
/// Public keys arrive as SPKI DER bytes and are decoded here, so a key the
/// codec rejects is the caller's error rather than a storage failure.
#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub fn backend_name(&self) -> &'static str {
        self.repository.backend_name()
    }

    pub async fn create_user(
        &self,
        request: CreateUserRequest,
    ) -> Result<UserResponse, ServiceError> {
        let public_key = PublicKey::from_spki_der(&request.public_key)?;

        let user = self
            .repository
            .create(NewUser {
                email: request.email,
                name: request.name,
                public_key,
                wrapped_private_key: request.wrapped_private_key,
                wrapped_master_key: request.wrapped_master_key,
            })
            .await?;

        Ok(user.into())
    }

    pub async fn get_user_by_pk(&self, public_key: &[u8]) -> Result<UserResponse, ServiceError> {
        PublicKey::from_spki_der(public_key)?;

        let user = self.repository.get_by_pk(public_key).await?;
        Ok(user.into())
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<UserResponse, ServiceError> {
        let user = self.repository.get_by_email(email).await?;
        Ok(user.into())
    }

    /// Resolve an email to its public key without returning the wrapped keys
    pub async fn get_user_pk_by_email(
        &self,
        email: &str,
    ) -> Result<UserPublicKeyResponse, ServiceError> {
        let user = self.repository.get_by_email(email).await?;
        Ok(user.into())
    }

    pub async fn delete_user_by_email(&self, email: &str) -> Result<(), ServiceError> {
        self.repository.delete_by_email(email).await?;
        Ok(())
    }
}
