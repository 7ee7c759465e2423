use chrono::{DateTime, Utc};
use ring::rand::SystemRandom;
use ring::signature::{
    ECDSA_P256_SHA256_ASN1_SIGNING, ECDSA_P384_SHA384_ASN1_SIGNING, EcdsaKeyPair, KeyPair,
};
use userstore::{EcCurve, EcdsaPublicKey, NewUser, PublicKey};

/// Generate a public key the way a client would, through ring
pub fn generate_public_key(curve: EcCurve) -> PublicKey {
    let algorithm = match curve {
        EcCurve::P256 => &ECDSA_P256_SHA256_ASN1_SIGNING,
        EcCurve::P384 => &ECDSA_P384_SHA384_ASN1_SIGNING,
        EcCurve::P521 => panic!("ring cannot generate P-521 keys"),
    };
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(algorithm, &rng).expect("key generation");
    let key_pair =
        EcdsaKeyPair::from_pkcs8(algorithm, pkcs8.as_ref(), &rng).expect("generated pkcs8 parses");

    PublicKey::from(
        EcdsaPublicKey::from_sec1_point(curve, key_pair.public_key().as_ref())
            .expect("ring emits uncompressed points"),
    )
}

pub fn new_user(email: &str, name: &str, public_key: PublicKey) -> NewUser {
    NewUser {
        email: email.to_string(),
        name: name.to_string(),
        public_key,
        wrapped_private_key: b"B1: wrapped private key".to_vec(),
        wrapped_master_key: b"B2: wrapped master key".to_vec(),
    }
}

/// Emails must not collide between backends that share a server across test runs
pub fn unique_email(local: &str) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{local}.{}.{nanos}@email.com", std::process::id())
}

/// Assert `at` lies within a few seconds of the current time
pub fn assert_recent(at: DateTime<Utc>) {
    let age = Utc::now() - at;
    assert!(
        age.num_seconds().abs() <= 5,
        "timestamp {at} is not close to now"
    );
}
