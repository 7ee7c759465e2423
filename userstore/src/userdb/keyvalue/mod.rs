mod store_type;
mod types;

pub use store_type::KeyValueUserRepository;
