//! Public-key model and its canonical SubjectPublicKeyInfo encoding

mod errors;
mod spki;
mod types;

pub use errors::KeyError;
pub use types::{EcCurve, EcdsaPublicKey, PublicKey, fingerprint};
