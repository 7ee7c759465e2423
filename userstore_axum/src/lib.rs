//! userstore-axum - HTTP+JSON routes for the userstore service

mod error;
mod router;

pub use error::IntoResponseError;
pub use router::userstore_router;

pub use userstore::{StoreConfig, UserService, open_repository};
