// Path: crates/test_utils/src/randomness.rs
//! Deterministic randomness for reproducible identities and ids.

use ica_crypto::sign::bls::BlsKeyPair;
use ica_crypto::sign::eddsa::Ed25519Identity;
use ica_types::app::Principal;
use ica_types::error::CryptoError;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// A seeded generator; the same seed always yields the same fixtures.
pub struct TestRng {
    rng: StdRng,
}

impl TestRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn bytes<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        self.rng.fill_bytes(&mut out);
        out
    }

    /// An opaque principal of 1 to 29 bytes.
    pub fn principal(&mut self) -> Principal {
        let len = self.rng.gen_range(1..=ica_types::MAX_PRINCIPAL_BYTES);
        let bytes: [u8; ica_types::MAX_PRINCIPAL_BYTES] = self.bytes();
        Principal::try_from_slice(bytes.get(..len).unwrap_or_default())
            .unwrap_or_else(|_| Principal::anonymous())
    }

    pub fn identity(&mut self) -> Result<Ed25519Identity, CryptoError> {
        Ed25519Identity::from_seed(&self.bytes::<32>())
    }

    pub fn bls_key(&mut self) -> BlsKeyPair {
        BlsKeyPair::from_seed(&self.bytes::<32>())
    }
}

impl Default for TestRng {
    fn default() -> Self {
        Self::new(12345)
    }
}
