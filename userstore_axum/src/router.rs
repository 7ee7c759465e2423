//! User routes
//!
//! - `POST   /users`
//! - `GET    /users/email/{email}`
//! - `GET    /users/email/{email}/public-key`
//! - `DELETE /users/email/{email}`
//! - `GET    /users/pk/{public_key}` (base64url SPKI DER)

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};

use userstore::{
    CreateUserRequest, UserPublicKeyResponse, UserResponse, UserService, base64url_decode,
};

use crate::error::IntoResponseError;

/// Router for the user endpoints, backed by `service`
pub fn userstore_router(service: UserService) -> Router {
    Router::new()
        .route("/users", post(create_user))
        .route(
            "/users/email/{email}",
            get(get_user_by_email).delete(delete_user_by_email),
        )
        .route("/users/email/{email}/public-key", get(get_user_pk_by_email))
        .route("/users/pk/{public_key}", get(get_user_by_pk))
        .with_state(service)
}

async fn create_user(
    State(service): State<UserService>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), (StatusCode, String)> {
    let user = service.create_user(request).await.into_response_error()?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user_by_email(
    State(service): State<UserService>,
    Path(email): Path<String>,
) -> Result<Json<UserResponse>, (StatusCode, String)> {
    let user = service
        .get_user_by_email(&email)
        .await
        .into_response_error()?;
    Ok(Json(user))
}

async fn get_user_pk_by_email(
    State(service): State<UserService>,
    Path(email): Path<String>,
) -> Result<Json<UserPublicKeyResponse>, (StatusCode, String)> {
    let response = service
        .get_user_pk_by_email(&email)
        .await
        .into_response_error()?;
    Ok(Json(response))
}

async fn delete_user_by_email(
    State(service): State<UserService>,
    Path(email): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    service
        .delete_user_by_email(&email)
        .await
        .into_response_error()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_user_by_pk(
    State(service): State<UserService>,
    Path(public_key): Path<String>,
) -> Result<Json<UserResponse>, (StatusCode, String)> {
    let public_key = base64url_decode(&public_key).into_response_error()?;
    let user = service
        .get_user_by_pk(&public_key)
        .await
        .into_response_error()?;
    Ok(Json(user))
}
