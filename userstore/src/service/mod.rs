mod errors;
mod user_service;
mod types;

pub use errors::ServiceError;
pub use user_service::UserService;
pub use types::{CreateUserRequest, UserPublicKeyResponse, UserResponse};
