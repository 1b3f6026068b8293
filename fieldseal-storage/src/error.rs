//! Error types for the storage layer.

use crate::engine::BoxError;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The schema cannot change once the connection is open.
    #[error("database {0:?} is open; its schema can no longer be changed")]
    DatabaseOpen(String),

    /// The connection is not open.
    #[error("database {0:?} is not open")]
    DatabaseClosed(String),

    /// The open database has no such table.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// The declared schema version is older than the stored one.
    #[error("declared version {declared} is lower than stored version {stored}")]
    VersionMismatch { declared: u32, stored: u32 },

    /// A write would violate a key constraint.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Lookups are only allowed on the primary key and index fields.
    #[error("field {field:?} is not indexed on table {table:?}")]
    NotIndexed { table: String, field: String },

    /// The primary key is missing or not a string or integer.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Invalid schema definition.
    #[error("schema error: {0}")]
    Schema(#[from] fieldseal_model::ModelError),

    /// A table hook or `modify_all` callback failed.
    #[error("{0}")]
    Callback(#[source] BoxError),

    /// A ready handler failed; the connection was closed again.
    #[error("{0}")]
    Ready(#[source] BoxError),
}
