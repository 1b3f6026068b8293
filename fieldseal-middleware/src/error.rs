//! Error types for the encryption middleware.

use fieldseal_crypto::ProviderError;
use fieldseal_model::ModelError;
use fieldseal_storage::{BoxError, StorageError};
use thiserror::Error;

/// Result type for middleware operations.
pub type EncryptResult<T> = Result<T, EncryptError>;

/// Errors raised by the encryption middleware.
#[derive(Debug, Error)]
pub enum EncryptError {
    /// `install` was called on a connection that is already open.
    #[error("fieldseal: the middleware cannot be installed on an open database")]
    DatabaseAlreadyOpen,

    /// The open database lacks the settings table. The schema version must be
    /// bumped so the table gets created.
    #[error("fieldseal: can't find its encryption table; you may need to bump your database version")]
    EncryptionTableNotFound,

    /// Failure of the injected encryption provider, unchanged.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Any other storage engine failure, unchanged.
    #[error(transparent)]
    Storage(StorageError),

    /// A table schema built by the middleware is invalid.
    #[error(transparent)]
    Schema(#[from] ModelError),

    /// The ciphertext field holds something that is not an encoded blob.
    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl EncryptError {
    /// Recovers a middleware or provider error carried through the storage
    /// engine as a boxed hook, callback or ready-handler error.
    fn from_boxed(source: BoxError) -> Result<Self, BoxError> {
        let source = match source.downcast::<EncryptError>() {
            Ok(err) => return Ok(*err),
            Err(source) => source,
        };
        match source.downcast::<ProviderError>() {
            Ok(err) => Ok(EncryptError::Provider(*err)),
            Err(source) => Err(source),
        }
    }
}

impl From<StorageError> for EncryptError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Callback(source) => {
                Self::from_boxed(source).unwrap_or_else(|s| Self::Storage(StorageError::Callback(s)))
            }
            StorageError::Ready(source) => {
                Self::from_boxed(source).unwrap_or_else(|s| Self::Storage(StorageError::Ready(s)))
            }
            other => EncryptError::Storage(other),
        }
    }
}
