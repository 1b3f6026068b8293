//! Brings stored data in line with the requested set of encrypted tables.

use crate::codec::{is_encrypted, Codec, WipeMode};
use crate::error::{EncryptError, EncryptResult};
use crate::hooks::install_hooks;
use crate::scenario::{classify, Scenario};
use crate::settings::SettingsStore;
use async_trait::async_trait;
use fieldseal_model::Record;
use fieldseal_storage::{BoxError, Database, ReadyHandler, Table};
use futures::future::try_join_all;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// What one reconciliation pass did to one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableOutcome {
    pub table: String,
    pub scenario: Scenario,
    /// Records whose stored form was rewritten by the bulk transform.
    pub rewritten: usize,
}

/// Per-table outcomes of a completed pass, in the order the database
/// reported its tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub tables: Vec<TableOutcome>,
}

impl ReconcileReport {
    pub fn scenario_of(&self, table: &str) -> Option<Scenario> {
        self.outcome_of(table).map(|o| o.scenario)
    }

    pub fn outcome_of(&self, table: &str) -> Option<&TableOutcome> {
        self.tables.iter().find(|o| o.table == table)
    }

    /// Total records rewritten across all tables.
    pub fn rewritten(&self) -> usize {
        self.tables.iter().map(|o| o.rewritten).sum()
    }
}

/// Ready handler running reconciliation each time its connection opens.
pub struct Reconciler {
    codec: Codec,
    requested: Vec<String>,
    last_report: Mutex<Option<ReconcileReport>>,
}

impl Reconciler {
    pub fn new(codec: Codec, requested: Vec<String>) -> Self {
        Self {
            codec,
            requested,
            last_report: Mutex::new(None),
        }
    }

    /// Tables this reconciler keeps encrypted.
    pub fn requested(&self) -> &[String] {
        &self.requested
    }

    /// Report of the most recent successful pass.
    pub fn last_report(&self) -> Option<ReconcileReport> {
        self.last_report
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Runs one reconciliation pass over the open database `db`.
    ///
    /// Every table is processed concurrently. Settings are persisted only
    /// after all tables succeed, so an aborted pass is re-run in full on the
    /// next open.
    pub async fn reconcile(&self, db: &dyn Database) -> EncryptResult<ReconcileReport> {
        let settings = SettingsStore::locate(db)?;
        let previous = settings.previous().await?;

        let tables = db.tables();
        let outcomes = try_join_all(
            tables
                .iter()
                .map(|table| self.reconcile_table(table.as_ref(), &previous.tables)),
        )
        .await?;

        settings.persist(&self.requested).await?;

        let report = ReconcileReport { tables: outcomes };
        *self
            .last_report
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(report.clone());
        Ok(report)
    }

    async fn reconcile_table(
        &self,
        table: &dyn Table,
        previous: &[String],
    ) -> EncryptResult<TableOutcome> {
        let name = table.name().to_string();
        let scenario = classify(&name, &self.requested, previous);

        let rewritten = match scenario {
            Scenario::UnencryptedToEncrypted => {
                info!("{}: encrypting existing records", name);
                self.encrypt_all(table).await?
            }
            Scenario::EncryptedToUnencrypted => {
                info!("{}: decrypting existing records", name);
                self.decrypt_all(table).await?
            }
            Scenario::IsSettingsTable
            | Scenario::UnencryptedNoChange
            | Scenario::EncryptedNoChange => {
                debug!("{}: {:?}, no records to rewrite", name, scenario);
                0
            }
        };
        if scenario.installs_hooks() {
            install_hooks(table, &self.codec);
        }

        Ok(TableOutcome {
            table: name,
            scenario,
            rewritten,
        })
    }

    async fn encrypt_all(&self, table: &dyn Table) -> EncryptResult<usize> {
        let schema = table.schema();
        let codec = &self.codec;
        let encrypt = |mut record: Record| -> Result<Record, BoxError> {
            if is_encrypted(&record) {
                return Ok(record);
            }
            codec.encrypt(schema, &mut record)?;
            Ok(record)
        };
        Ok(table.modify_all(&encrypt).await?)
    }

    async fn decrypt_all(&self, table: &dyn Table) -> EncryptResult<usize> {
        let codec = &self.codec;
        let decrypt = |record: Record| -> Result<Record, BoxError> {
            Ok(codec.decrypt(record, WipeMode::Delete)?)
        };
        Ok(table.modify_all(&decrypt).await?)
    }
}

#[async_trait]
impl ReadyHandler for Reconciler {
    async fn on_ready(&self, db: &dyn Database) -> Result<(), BoxError> {
        match self.reconcile(db).await {
            Ok(report) => {
                debug!(
                    "Reconciled {} ({} records rewritten)",
                    db.name(),
                    report.rewritten()
                );
                Ok(())
            }
            Err(e) => {
                warn!("Reconciliation of {} aborted: {}", db.name(), e);
                Err(e.into())
            }
        }
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("requested", &self.requested)
            .finish_non_exhaustive()
    }
}
