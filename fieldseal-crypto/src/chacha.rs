//! Records sealed with ChaCha20-Poly1305.
//!
//! A sealed record is `version (1 byte) || nonce (12 bytes) || ciphertext || tag (16 bytes)`,
//! where the ciphertext is the record's JSON. The version byte is authenticated
//! as associated data, so a blob cannot be replayed under another format.

use crate::key::RecordKey;
use crate::provider::{EncryptionProvider, ProviderError, ProviderResult};
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use fieldseal_model::Record;
use rand::RngCore;

/// Layout version written in front of every sealed record.
pub const SEALED_FORMAT_VERSION: u8 = 1;

const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;
const HEADER_SIZE: usize = 1 + NONCE_SIZE;

/// Bytes a sealed record adds on top of its JSON.
pub const SEALED_OVERHEAD: usize = HEADER_SIZE + TAG_SIZE;

/// Seals records under one [`RecordKey`].
///
/// Every call draws a fresh nonce, so sealing the same record twice yields
/// different blobs.
#[derive(Debug, Clone)]
pub struct ChaChaProvider {
    key: RecordKey,
}

impl ChaChaProvider {
    pub fn new(key: RecordKey) -> Self {
        Self { key }
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(self.key.expose().into())
    }
}

impl EncryptionProvider for ChaChaProvider {
    fn encrypt(&self, plain: &Record) -> ProviderResult<Vec<u8>> {
        let json = serde_json::to_vec(plain)?;

        let mut nonce = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut nonce);
        let header = [SEALED_FORMAT_VERSION];
        let sealed = self
            .cipher()
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: &json,
                    aad: &header,
                },
            )
            .map_err(|e| ProviderError::Crypto(format!("sealing failed: {e}")))?;

        let mut blob = Vec::with_capacity(HEADER_SIZE + sealed.len());
        blob.extend_from_slice(&header);
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&sealed);
        Ok(blob)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> ProviderResult<Record> {
        if ciphertext.len() < SEALED_OVERHEAD {
            return Err(ProviderError::Crypto(format!(
                "sealed record too short: {} bytes",
                ciphertext.len()
            )));
        }
        let (header, rest) = ciphertext.split_at(1);
        if header[0] != SEALED_FORMAT_VERSION {
            return Err(ProviderError::Crypto(format!(
                "unsupported sealed record version {}",
                header[0]
            )));
        }
        let (nonce, sealed) = rest.split_at(NONCE_SIZE);

        let json = self
            .cipher()
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: sealed,
                    aad: header,
                },
            )
            .map_err(|_| ProviderError::Crypto("wrong key or tampered record".to_string()))?;
        Ok(serde_json::from_slice(&json)?)
    }
}
