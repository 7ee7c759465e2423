use oid_registry::{
    OID_EC_P256, OID_KEY_TYPE_EC_PUBLIC_KEY, OID_NIST_EC_P384, OID_NIST_EC_P521, Oid,
};
use x509_parser::prelude::FromDer;
use x509_parser::public_key::PublicKey as ParsedPublicKey;
use x509_parser::x509::SubjectPublicKeyInfo;

use super::errors::KeyError;
use super::types::{EcCurve, EcdsaPublicKey, PublicKey};

// DER header of a SubjectPublicKeyInfo carrying id-ecPublicKey with a named
// curve, up to and including the BIT STRING's unused-bits octet. The
// uncompressed point follows directly.
const P256_SPKI_HEADER: [u8; 26] = [
    0x30, 0x59, 0x30, 0x13, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x08,
    0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07, 0x03, 0x42, 0x00,
];
const P384_SPKI_HEADER: [u8; 23] = [
    0x30, 0x76, 0x30, 0x10, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x05,
    0x2b, 0x81, 0x04, 0x00, 0x22, 0x03, 0x62, 0x00,
];
const P521_SPKI_HEADER: [u8; 25] = [
    0x30, 0x81, 0x9b, 0x30, 0x10, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06,
    0x05, 0x2b, 0x81, 0x04, 0x00, 0x23, 0x03, 0x81, 0x86, 0x00,
];

fn spki_header(curve: EcCurve) -> &'static [u8] {
    match curve {
        EcCurve::P256 => &P256_SPKI_HEADER,
        EcCurve::P384 => &P384_SPKI_HEADER,
        EcCurve::P521 => &P521_SPKI_HEADER,
    }
}

fn curve_from_oid(oid: &Oid) -> Result<EcCurve, KeyError> {
    if *oid == OID_EC_P256 {
        Ok(EcCurve::P256)
    } else if *oid == OID_NIST_EC_P384 {
        Ok(EcCurve::P384)
    } else if *oid == OID_NIST_EC_P521 {
        Ok(EcCurve::P521)
    } else {
        Err(KeyError::UnsupportedCurve(oid.to_id_string()))
    }
}

pub(super) fn encode(key: &PublicKey) -> Vec<u8> {
    let PublicKey::Ecdsa(key) = key;
    let header = spki_header(key.curve());

    let mut der = Vec::with_capacity(header.len() + key.point().len());
    der.extend_from_slice(header);
    der.extend_from_slice(key.point());
    der
}

pub(super) fn decode(der: &[u8]) -> Result<PublicKey, KeyError> {
    let (rest, spki) = SubjectPublicKeyInfo::from_der(der)
        .map_err(|e| KeyError::Malformed(format!("invalid SubjectPublicKeyInfo: {e}")))?;

    if !rest.is_empty() {
        return Err(KeyError::Malformed(format!(
            "{} trailing bytes after SubjectPublicKeyInfo",
            rest.len()
        )));
    }

    let algorithm = &spki.algorithm.algorithm;
    if *algorithm != OID_KEY_TYPE_EC_PUBLIC_KEY {
        return Err(KeyError::UnsupportedAlgorithm(algorithm.to_id_string()));
    }

    let curve_oid = spki
        .algorithm
        .parameters
        .as_ref()
        .and_then(|params| params.as_oid().ok())
        .ok_or_else(|| KeyError::Malformed("missing named curve parameter".to_string()))?;
    let curve = curve_from_oid(&curve_oid)?;

    let point = match spki.parsed() {
        Ok(ParsedPublicKey::EC(point)) => point.data().to_vec(),
        Ok(_) => {
            return Err(KeyError::UnsupportedAlgorithm(algorithm.to_id_string()));
        }
        Err(e) => {
            return Err(KeyError::Malformed(format!("invalid EC point: {e}")));
        }
    };

    let key = PublicKey::Ecdsa(EcdsaPublicKey::from_sec1_point(curve, point)?);

    // The encoded key doubles as a primary key, so only the canonical form is accepted
    if key.to_spki_der() != der {
        return Err(KeyError::Malformed(
            "non-canonical SubjectPublicKeyInfo encoding".to_string(),
        ));
    }

    Ok(key)
}
