//! Injects the settings table into every declared schema version.

use crate::error::{EncryptError, EncryptResult};
use fieldseal_model::{
    DatabaseSchema, TableSchema, ENCRYPTION_SETTINGS_SPEC, ENCRYPTION_SETTINGS_TABLE,
};
use fieldseal_storage::{Database, SchemaAugmenter};
use tracing::debug;

/// Adds the settings table to each declared version before it is finalized.
#[derive(Debug, Clone)]
pub struct SettingsTableAugmenter {
    schema: TableSchema,
}

impl SettingsTableAugmenter {
    pub fn new() -> EncryptResult<Self> {
        let schema = TableSchema::parse(ENCRYPTION_SETTINGS_TABLE, ENCRYPTION_SETTINGS_SPEC)?;
        Ok(Self { schema })
    }

    /// Schema of the hidden settings table: an auto-incrementing `id` and nothing else.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }
}

impl SchemaAugmenter for SettingsTableAugmenter {
    fn augment(&self, version: u32, tables: &mut DatabaseSchema) {
        debug!("Adding {} to schema version {}", ENCRYPTION_SETTINGS_TABLE, version);
        tables.insert(ENCRYPTION_SETTINGS_TABLE.to_string(), self.schema.clone());
    }
}

/// Fails with [`EncryptError::DatabaseAlreadyOpen`] when the schema of `db`
/// can no longer change.
///
/// Probes by redeclaring the current version with no tables, which leaves
/// the declared schema as it was.
pub fn ensure_not_open(db: &dyn Database) -> EncryptResult<()> {
    let verno = db.verno();
    if verno > 0 {
        db.version(verno, DatabaseSchema::new())
            .map_err(|_| EncryptError::DatabaseAlreadyOpen)?;
    }
    if db.is_open() {
        return Err(EncryptError::DatabaseAlreadyOpen);
    }
    Ok(())
}
