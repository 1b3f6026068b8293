//! The storage engine interface consumed by the encryption middleware.

use crate::error::StorageResult;
use async_trait::async_trait;
use fieldseal_model::{DatabaseSchema, Modifications, Record, TableSchema};
use serde_json::Value;
use std::sync::Arc;

/// Error type carried out of hooks, callbacks and ready handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Appends table definitions to a declared schema version before it is finalized.
///
/// Augmenters are registered per connection and run for every declared
/// version when the connection opens.
pub trait SchemaAugmenter: Send + Sync {
    fn augment(&self, version: u32, tables: &mut DatabaseSchema);
}

/// Runs once the connection is open and its schema is final.
///
/// A failing handler aborts the open.
#[async_trait]
pub trait ReadyHandler: Send + Sync {
    async fn on_ready(&self, db: &dyn Database) -> Result<(), BoxError>;
}

/// Per-record interception points of a table.
///
/// Hooks run synchronously inside the engine's write and read paths.
pub trait TableHooks: Send + Sync {
    /// Called with the record about to be stored by `add` or `put`.
    /// The engine persists the record as left by the hook.
    fn on_create(&self, record: &mut Record) -> Result<(), BoxError>;

    /// Called before an update with the incoming modifications and the
    /// currently stored record. Returned modifications are applied on top of
    /// the incoming ones; `None` leaves the update untouched.
    fn on_update(
        &self,
        modifications: &Modifications,
        key: &Value,
        current: &Record,
    ) -> Result<Option<Modifications>, BoxError>;

    /// Called with each stored record on its way to the caller.
    fn on_read(&self, record: Record) -> Result<Record, BoxError>;
}

/// A connection to a named database.
#[async_trait]
pub trait Database: Send + Sync {
    fn name(&self) -> &str;

    /// Highest declared schema version, `0` when none was declared.
    fn verno(&self) -> u32;

    fn is_open(&self) -> bool;

    /// Declares (or extends) the tables of schema `version`.
    ///
    /// Fails with [`StorageError::DatabaseOpen`](crate::StorageError::DatabaseOpen)
    /// once the connection is open.
    fn version(&self, version: u32, tables: DatabaseSchema) -> StorageResult<()>;

    fn add_schema_augmenter(&self, augmenter: Arc<dyn SchemaAugmenter>);

    fn on_ready(&self, handler: Arc<dyn ReadyHandler>);

    /// Finalizes the schema, opens the connection and runs ready handlers.
    async fn open(&self) -> StorageResult<()>;

    fn close(&self);

    /// Tables of the open database. Empty while closed.
    fn tables(&self) -> Vec<Arc<dyn Table>>;

    fn table(&self, name: &str) -> StorageResult<Arc<dyn Table>>;
}

/// A table of an open database.
#[async_trait]
pub trait Table: Send + Sync {
    fn name(&self) -> &str;

    fn schema(&self) -> &TableSchema;

    /// Inserts a new record and returns its primary key.
    async fn add(&self, record: Record) -> StorageResult<Value>;

    /// Inserts or replaces a record and returns its primary key.
    async fn put(&self, record: Record) -> StorageResult<Value>;

    async fn get(&self, key: &Value) -> StorageResult<Option<Record>>;

    /// First record whose `field` equals `value`. `field` must be the
    /// primary key or an index.
    async fn get_by(&self, field: &str, value: &Value) -> StorageResult<Option<Record>>;

    /// Applies `changes` to the record stored under `key`. Returns false when
    /// no such record exists.
    async fn update(&self, key: &Value, changes: Modifications) -> StorageResult<bool>;

    async fn delete(&self, key: &Value) -> StorageResult<bool>;

    /// Every record in primary key order.
    async fn to_vec(&self) -> StorageResult<Vec<Record>>;

    async fn count(&self) -> StorageResult<usize>;

    /// The record with the greatest primary key.
    async fn last(&self) -> StorageResult<Option<Record>>;

    async fn clear(&self) -> StorageResult<()>;

    /// Rewrites every stored record through `f` and returns how many changed.
    ///
    /// Operates on raw stored records and bypasses hooks. Nothing is written
    /// unless `f` succeeds for every record.
    async fn modify_all(
        &self,
        f: &(dyn Fn(Record) -> Result<Record, BoxError> + Send + Sync),
    ) -> StorageResult<usize>;

    /// Registers the hooks of this table on this connection, replacing any
    /// previously registered ones.
    fn set_hooks(&self, hooks: Arc<dyn TableHooks>);
}
