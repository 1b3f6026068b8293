//! Access to the hidden settings table.

use crate::error::{EncryptError, EncryptResult};
use fieldseal_model::{EncryptionSettings, ENCRYPTION_SETTINGS_TABLE};
use fieldseal_storage::{Database, StorageError, Table};
use std::sync::Arc;
use tracing::debug;

fn map_not_found(err: StorageError) -> EncryptError {
    match err {
        StorageError::TableNotFound(_) => EncryptError::EncryptionTableNotFound,
        other => other.into(),
    }
}

/// Reads and writes the [`EncryptionSettings`] of one open database.
pub struct SettingsStore {
    table: Arc<dyn Table>,
}

impl SettingsStore {
    /// Locates the settings table of `db`.
    pub fn locate(db: &dyn Database) -> EncryptResult<Self> {
        let table = db.table(ENCRYPTION_SETTINGS_TABLE).map_err(map_not_found)?;
        Ok(Self { table })
    }

    /// The most recently written settings, or empty settings on first run.
    pub async fn previous(&self) -> EncryptResult<EncryptionSettings> {
        let last = self.table.last().await.map_err(map_not_found)?;
        let settings = last
            .map(|record| EncryptionSettings::from_record(&record))
            .unwrap_or_default();
        debug!("Previous encrypted tables: {:?}", settings.tables);
        Ok(settings)
    }

    /// Replaces the stored history with a single record for `tables`.
    pub async fn persist(&self, tables: &[String]) -> EncryptResult<()> {
        self.table.clear().await.map_err(map_not_found)?;
        self.table
            .put(EncryptionSettings::new(tables.to_vec()).to_record())
            .await
            .map_err(map_not_found)?;
        debug!("Persisted encrypted tables: {:?}", tables);
        Ok(())
    }
}
