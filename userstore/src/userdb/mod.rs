mod errors;
mod keyvalue;
mod relational;
mod repository;
mod types;

pub use errors::{Operation, RepositoryError, UserError};
pub use keyvalue::KeyValueUserRepository;
pub use relational::SqlUserRepository;
pub use repository::{UserRepository, open_repository};
pub use types::{NewUser, User};
