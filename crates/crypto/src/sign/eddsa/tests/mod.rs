// Path: crates/crypto/src/sign/eddsa/tests/mod.rs
use super::*;

#[test]
fn test_identity_signs_verifiably() {
    let identity = Ed25519Identity::generate();
    let message = b"\x0aic-request0123456789abcdef0123456789abcdef";

    let signature = identity.sign(message).unwrap().unwrap();
    assert_eq!(signature.len(), 64);

    let signature = Ed25519Signature::from_bytes(&signature).unwrap();
    assert!(identity.verifying_key().verify(message, &signature).is_ok());
    assert!(identity.verifying_key().verify(b"tampered", &signature).is_err());
}

#[test]
fn test_der_public_key_roundtrip() {
    let identity = Ed25519Identity::from_seed(&[7u8; 32]).unwrap();
    let der = identity.public_key().unwrap();

    assert_eq!(der.len(), 44);
    assert!(der.starts_with(&ED25519_DER_PREFIX));

    let key = Ed25519PublicKey::from_der(&der).unwrap();
    assert_eq!(key, identity.verifying_key());
}

#[test]
fn test_sender_is_self_authenticating() {
    let identity = Ed25519Identity::from_seed(&[1u8; 32]).unwrap();
    let sender = identity.sender();
    let bytes = sender.as_slice();

    assert_eq!(bytes.len(), 29);
    assert_eq!(bytes.last(), Some(&SELF_AUTHENTICATING_TAG));
    assert_eq!(&bytes[..28], &sha224(&identity.public_key().unwrap())[..]);
    assert!(!sender.is_anonymous());
}

#[test]
fn test_seed_length_is_checked() {
    assert_eq!(
        Ed25519Identity::from_seed(&[0u8; 31]).unwrap_err(),
        CryptoError::InvalidLength {
            expected: 32,
            got: 31
        }
    );
}

#[test]
fn test_same_seed_same_principal() {
    let a = Ed25519Identity::from_seed(&[9u8; 32]).unwrap();
    let b = Ed25519Identity::from_seed(&[9u8; 32]).unwrap();
    assert_eq!(a.sender(), b.sender());
}
