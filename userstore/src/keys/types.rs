use std::fmt;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ring::digest;
use ring::signature::{self, UnparsedPublicKey, VerificationAlgorithm};

use super::errors::KeyError;
use super::spki;

/// Named curves accepted for user keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcCurve {
    P256,
    P384,
    P521,
}

impl EcCurve {
    /// Length of an uncompressed SEC1 point (`0x04 || X || Y`) on this curve
    pub const fn point_len(self) -> usize {
        match self {
            Self::P256 => 65,
            Self::P384 => 97,
            Self::P521 => 133,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::P521 => "P-521",
        }
    }
}

impl fmt::Display for EcCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An ECDSA public key held as an uncompressed SEC1 point
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EcdsaPublicKey {
    curve: EcCurve,
    point: Vec<u8>,
}

impl EcdsaPublicKey {
    /// Build a key from an uncompressed SEC1 point.
    ///
    /// The point must carry the `0x04` tag and have the exact length for the
    /// curve. Compressed points are rejected so that every key has exactly one
    /// SubjectPublicKeyInfo encoding.
    pub fn from_sec1_point(curve: EcCurve, point: impl Into<Vec<u8>>) -> Result<Self, KeyError> {
        let point = point.into();

        match point.first() {
            Some(0x04) => {}
            Some(0x02) | Some(0x03) => {
                return Err(KeyError::Malformed(
                    "compressed EC points are not supported".to_string(),
                ));
            }
            Some(tag) => {
                return Err(KeyError::Malformed(format!(
                    "unknown EC point encoding tag 0x{tag:02x}"
                )));
            }
            None => return Err(KeyError::Malformed("empty EC point".to_string())),
        }

        if point.len() != curve.point_len() {
            return Err(KeyError::Malformed(format!(
                "{curve} point must be {} bytes, got {}",
                curve.point_len(),
                point.len()
            )));
        }

        Ok(Self { curve, point })
    }

    pub fn curve(&self) -> EcCurve {
        self.curve
    }

    pub fn point(&self) -> &[u8] {
        &self.point
    }
}

impl fmt::Debug for EcdsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcdsaPublicKey")
            .field("curve", &self.curve)
            .field("fingerprint", &fingerprint(&self.point))
            .finish()
    }
}

/// A user's public key.
///
/// Only elliptic-curve keys are representable; any other algorithm is rejected
/// when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PublicKey {
    Ecdsa(EcdsaPublicKey),
}

impl PublicKey {
    /// Decode an X.509 SubjectPublicKeyInfo (DER)
    pub fn from_spki_der(der: &[u8]) -> Result<Self, KeyError> {
        spki::decode(der)
    }

    /// Canonical X.509 SubjectPublicKeyInfo (DER) encoding
    pub fn to_spki_der(&self) -> Vec<u8> {
        spki::encode(self)
    }

    pub fn curve(&self) -> EcCurve {
        let Self::Ecdsa(key) = self;
        key.curve()
    }

    /// Short identifier derived from the SPKI encoding, safe to put in logs
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.to_spki_der())
    }

    /// Verify an ASN.1 DER encoded ECDSA signature over `message`.
    ///
    /// P-256 uses SHA-256 and P-384 uses SHA-384. P-521 keys can be stored but
    /// not used for verification.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), KeyError> {
        let Self::Ecdsa(key) = self;

        let algorithm: &'static dyn VerificationAlgorithm = match key.curve {
            EcCurve::P256 => &signature::ECDSA_P256_SHA256_ASN1,
            EcCurve::P384 => &signature::ECDSA_P384_SHA384_ASN1,
            EcCurve::P521 => {
                return Err(KeyError::UnsupportedCurve(
                    "P-521 signatures cannot be verified".to_string(),
                ));
            }
        };

        UnparsedPublicKey::new(algorithm, key.point())
            .verify(message, signature)
            .map_err(|_| KeyError::InvalidSignature)
    }
}

impl From<EcdsaPublicKey> for PublicKey {
    fn from(key: EcdsaPublicKey) -> Self {
        Self::Ecdsa(key)
    }
}

/// Short base64url SHA-256 digest of arbitrary key bytes
///
/// Used as the subject of log lines and errors for lookups by key, including
/// lookups with bytes that do not decode.
pub fn fingerprint(bytes: &[u8]) -> String {
    let hash = digest::digest(&digest::SHA256, bytes);
    URL_SAFE_NO_PAD.encode(&hash.as_ref()[..12])
}
