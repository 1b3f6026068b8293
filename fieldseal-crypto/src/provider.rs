//! The encryption capability injected into the middleware.
//!
//! The middleware depends on `Arc<dyn EncryptionProvider>` and never sees
//! key material. Failures are returned as [`ProviderError`] and propagated
//! to the caller unchanged.

use fieldseal_model::Record;
use thiserror::Error;

/// Errors from an encryption provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No key is available.
    #[error("encryption provider unavailable")]
    Unavailable,
    /// Sealing failed, or the blob is malformed, tampered or sealed under another key.
    #[error("crypto error: {0}")]
    Crypto(String),
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
    /// The plaintext could not be serialized or the decrypted bytes are not a record.
    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Serialization(err.to_string())
    }
}

/// Turns a plaintext record into opaque bytes and back.
pub trait EncryptionProvider: Send + Sync {
    /// Encrypts `plain` into an opaque blob.
    fn encrypt(&self, plain: &Record) -> ProviderResult<Vec<u8>>;

    /// Decrypts a blob previously produced by `encrypt`.
    fn decrypt(&self, ciphertext: &[u8]) -> ProviderResult<Record>;
}

/// Serializes records as JSON without encrypting them.
///
/// Useful in tests and for inspecting what a real provider would seal.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughProvider;

impl EncryptionProvider for PassthroughProvider {
    fn encrypt(&self, plain: &Record) -> ProviderResult<Vec<u8>> {
        Ok(serde_json::to_vec(plain)?)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> ProviderResult<Record> {
        Ok(serde_json::from_slice(ciphertext)?)
    }
}
