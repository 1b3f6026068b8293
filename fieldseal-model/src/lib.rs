//! Core data model for fieldseal.
//!
//! Defines the types shared by the storage engine and the encryption layer:
//! - [`Record`]: a document as a JSON object (field name → value)
//! - [`TableSchema`]: a table's primary key and index fields, the fields that stay plaintext
//! - [`Modifications`]: the update-path change set, able to express field removal
//! - [`EncryptionSettings`]: the bookkeeping record describing which tables were encrypted
//!
//! The reserved names used by the encryption layer live here too so that the
//! storage engine, the middleware and tests agree on them.

mod record;
mod schema;
mod settings;

pub use record::{apply_modifications, to_modifications, FieldUpdate, Modifications, Record};
pub use schema::{DatabaseSchema, PrimaryKey, TableSchema};
pub use settings::EncryptionSettings;

/// Field holding the ciphertext blob of every non-index field of a stored record.
pub const ENCRYPTED_DATA_KEY: &str = "__data__";

/// Hidden table holding the [`EncryptionSettings`] history.
pub const ENCRYPTION_SETTINGS_TABLE: &str = "__EncryptionSettings__";

/// Store spec of the settings table: a single auto-incrementing primary key.
pub const ENCRYPTION_SETTINGS_SPEC: &str = "++id";

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur while building model types.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("invalid store spec for table {table:?}: {reason}")]
    InvalidStoreSpec { table: String, reason: String },
}
