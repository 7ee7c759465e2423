mod postgres;
mod sqlite;
mod store_type;
mod types;

pub use store_type::SqlUserRepository;
