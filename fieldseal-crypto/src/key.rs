//! Key material for [`ChaChaProvider`](crate::ChaChaProvider).

use crate::provider::{ProviderError, ProviderResult};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a record key in bytes.
pub const KEY_SIZE: usize = 32;

/// A 256-bit key sealing records. Wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct RecordKey([u8; KEY_SIZE]);

impl RecordKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Accepts exactly [`KEY_SIZE`] bytes, e.g. a key handed over by a keystore.
    pub fn from_slice(bytes: &[u8]) -> ProviderResult<Self> {
        <[u8; KEY_SIZE]>::try_from(bytes)
            .map(Self)
            .map_err(|_| ProviderError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: bytes.len(),
            })
    }

    /// A fresh key from the operating system's RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub(crate) fn expose(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RecordKey([REDACTED])")
    }
}

