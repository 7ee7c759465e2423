//! Shared helpers for unit tests: key generation and sample users

use ring::rand::SystemRandom;
use ring::signature::{
    ECDSA_P256_SHA256_ASN1_SIGNING, ECDSA_P384_SHA384_ASN1_SIGNING, EcdsaKeyPair,
    EcdsaSigningAlgorithm, KeyPair,
};

use crate::keys::{EcCurve, EcdsaPublicKey, PublicKey};
use crate::userdb::NewUser;

fn signing_algorithm(curve: EcCurve) -> &'static EcdsaSigningAlgorithm {
    match curve {
        EcCurve::P256 => &ECDSA_P256_SHA256_ASN1_SIGNING,
        EcCurve::P384 => &ECDSA_P384_SHA384_ASN1_SIGNING,
        EcCurve::P521 => panic!("ring cannot generate P-521 keys"),
    }
}

/// Fresh key pair on `curve` together with its public half as stored
pub(crate) fn generate_key_pair(curve: EcCurve) -> (EcdsaKeyPair, PublicKey) {
    let rng = SystemRandom::new();
    let algorithm = signing_algorithm(curve);

    let pkcs8 = EcdsaKeyPair::generate_pkcs8(algorithm, &rng).expect("key generation");
    let key_pair =
        EcdsaKeyPair::from_pkcs8(algorithm, pkcs8.as_ref(), &rng).expect("generated pkcs8 parses");
    let public_key = EcdsaPublicKey::from_sec1_point(curve, key_pair.public_key().as_ref())
        .expect("ring emits uncompressed points");

    (key_pair, PublicKey::from(public_key))
}

pub(crate) fn sample_key(curve: EcCurve) -> PublicKey {
    generate_key_pair(curve).1
}

pub(crate) fn new_user_with_key(email: &str, public_key: PublicKey) -> NewUser {
    NewUser {
        email: email.to_string(),
        name: "Test User".to_string(),
        public_key,
        wrapped_private_key: b"wrapped-private-key".to_vec(),
        wrapped_master_key: b"wrapped-master-key".to_vec(),
    }
}

/// A user with a freshly generated P-256 key
pub(crate) fn new_user(email: &str, name: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        ..new_user_with_key(email, sample_key(EcCurve::P256))
    }
}
