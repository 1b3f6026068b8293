//! Encryption providers for fieldseal.
//!
//! The middleware treats encryption as an injected capability: anything
//! implementing [`EncryptionProvider`] turns a plaintext record into opaque
//! bytes and back. Two providers ship with the crate:
//!
//! - [`PassthroughProvider`] serializes records without encrypting them
//! - [`ChaChaProvider`] seals records with ChaCha20-Poly1305
//!
//! Key derivation and rotation are left to the caller; a provider only ever
//! sees a ready [`RecordKey`].

mod chacha;
mod key;
mod provider;

pub use chacha::{ChaChaProvider, SEALED_FORMAT_VERSION, SEALED_OVERHEAD};
pub use key::{RecordKey, KEY_SIZE};
pub use provider::{EncryptionProvider, PassthroughProvider, ProviderError, ProviderResult};
