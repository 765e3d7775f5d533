// Path: crates/crypto/src/sign/bls/mod.rs
//! BLS12-381 signatures as used by certified state:
//! - Signatures in G1 (48 bytes compressed)
//! - Public Keys in G2 (96 bytes compressed, DER-framed on the wire)
//! - Hashing via hash-to-curve (`BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_NUL_`)

use crate::error::CryptoError;
use bls12_381::hash_to_curve::{ExpandMsgXmd, HashToCurve};
use bls12_381::{pairing, G1Affine, G1Projective, G2Affine, G2Projective, Scalar};
use ica_api::crypto::{DerPublicKey, SerializableKey, Signature, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha512};

// Domain Separation Tag for Hashing
const BLS_DST: &[u8] = b"BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_NUL_";

/// Length of a compressed G1 signature.
pub const BLS_SIGNATURE_LEN: usize = 48;
/// Length of a compressed G2 public key.
pub const BLS_PUBLIC_KEY_LEN: usize = 96;

/// `SubjectPublicKeyInfo` prefix (algorithm `bls12_381-g2`) preceding the raw
/// 96-byte key in root and subnet public keys.
pub const BLS_DER_PREFIX: [u8; 37] = [
    0x30, 0x81, 0x82, 0x30, 0x1d, 0x06, 0x0d, 0x2b, 0x06, 0x01, 0x04, 0x01, 0x82, 0xdc, 0x7c,
    0x05, 0x03, 0x01, 0x02, 0x01, 0x06, 0x0c, 0x2b, 0x06, 0x01, 0x04, 0x01, 0x82, 0xdc, 0x7c,
    0x05, 0x03, 0x02, 0x01, 0x03, 0x61, 0x00,
];

/// A signing key pair. The agent only verifies; replicas and test fixtures sign.
#[derive(Clone)]
pub struct BlsKeyPair {
    public_key: BlsPublicKey,
    secret_key: Scalar,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlsPublicKey(pub G2Affine);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlsSignature(pub G1Affine);

fn hash_to_g1(message: &[u8]) -> G1Affine {
    let point = <G1Projective as HashToCurve<ExpandMsgXmd<sha2::Sha256>>>::hash_to_curve(
        message, BLS_DST,
    );
    G1Affine::from(point)
}

impl BlsKeyPair {
    pub fn generate() -> Self {
        let mut wide = [0u8; 64];
        OsRng.fill_bytes(&mut wide);
        Self::from_scalar(Scalar::from_bytes_wide(&wide))
    }

    /// Deterministic key pair for reproducible fixtures.
    pub fn from_seed(seed: &[u8]) -> Self {
        let wide: [u8; 64] = Sha512::digest(seed).into();
        Self::from_scalar(Scalar::from_bytes_wide(&wide))
    }

    fn from_scalar(secret_key: Scalar) -> Self {
        let public = G2Affine::from(G2Projective::generator() * secret_key);
        Self {
            public_key: BlsPublicKey(public),
            secret_key,
        }
    }

    pub fn public_key(&self) -> BlsPublicKey {
        self.public_key.clone()
    }

    /// Sig = sk * H(m)
    pub fn sign(&self, message: &[u8]) -> BlsSignature {
        let hashed = G1Projective::from(hash_to_g1(message));
        BlsSignature(G1Affine::from(hashed * self.secret_key))
    }
}

impl VerifyingKey for BlsPublicKey {
    type Signature = BlsSignature;

    fn verify(&self, message: &[u8], signature: &Self::Signature) -> Result<(), CryptoError> {
        // e(sig, g2) == e(H(m), pk)
        let lhs = pairing(&signature.0, &G2Affine::generator());
        let rhs = pairing(&hash_to_g1(message), &self.0);

        if lhs == rhs {
            Ok(())
        } else {
            Err(CryptoError::VerificationFailed)
        }
    }
}

impl SerializableKey for BlsPublicKey {
    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_compressed().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; BLS_PUBLIC_KEY_LEN] =
            bytes.try_into().map_err(|_| CryptoError::InvalidLength {
                expected: BLS_PUBLIC_KEY_LEN,
                got: bytes.len(),
            })?;
        Option::<G2Affine>::from(G2Affine::from_compressed(&arr))
            .map(Self)
            .ok_or_else(|| CryptoError::InvalidKey("invalid G2 point".into()))
    }
}

impl DerPublicKey for BlsPublicKey {
    fn to_der(&self) -> Vec<u8> {
        let mut der = BLS_DER_PREFIX.to_vec();
        der.extend_from_slice(&self.0.to_compressed());
        der
    }

    fn from_der(der: &[u8]) -> Result<Self, CryptoError> {
        let raw = der.strip_prefix(&BLS_DER_PREFIX[..]).ok_or_else(|| {
            CryptoError::InvalidKey("missing bls12_381-g2 DER prefix".into())
        })?;
        Self::from_bytes(raw)
    }
}

impl SerializableKey for BlsSignature {
    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_compressed().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; BLS_SIGNATURE_LEN] =
            bytes.try_into().map_err(|_| CryptoError::InvalidLength {
                expected: BLS_SIGNATURE_LEN,
                got: bytes.len(),
            })?;
        Option::<G1Affine>::from(G1Affine::from_compressed(&arr))
            .map(Self)
            .ok_or_else(|| CryptoError::InvalidSignature("invalid G1 point".into()))
    }
}

impl Signature for BlsSignature {}

/// Verifies a raw signature over `message` under a DER-framed public key.
pub fn verify_der(der_public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
    let public_key = BlsPublicKey::from_der(der_public_key)?;
    let signature = BlsSignature::from_bytes(signature)?;
    public_key.verify(message, &signature)
}
