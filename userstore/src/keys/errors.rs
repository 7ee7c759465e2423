use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Malformed public key: {0}")]
    Malformed(String),

    #[error("Unsupported key algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Unsupported elliptic curve: {0}")]
    UnsupportedCurve(String),

    #[error("Signature verification failed")]
    InvalidSignature,
}
