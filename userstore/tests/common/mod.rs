pub mod backends;
pub mod fixtures;

pub use backends::{Backend, backends};
pub use fixtures::*;
