//! Per-table decision of what a reconciliation pass must do.

use fieldseal_model::ENCRYPTION_SETTINGS_TABLE;
use serde::{Deserialize, Serialize};

/// What reconciliation does with one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// The hidden settings table itself. Never transformed.
    IsSettingsTable,
    /// Plaintext before and after.
    UnencryptedNoChange,
    /// Newly requested: encrypt existing rows, then install hooks.
    UnencryptedToEncrypted,
    /// No longer requested: decrypt existing rows, no hooks.
    EncryptedToUnencrypted,
    /// Encrypted before and after: install hooks only.
    EncryptedNoChange,
}

impl Scenario {
    /// True when the table ends the pass with hooks installed.
    pub fn installs_hooks(self) -> bool {
        matches!(
            self,
            Scenario::UnencryptedToEncrypted | Scenario::EncryptedNoChange
        )
    }
}

/// Classifies `table` against the requested and previously recorded
/// encrypted-table sets. Membership is exact name equality.
pub fn classify<S: AsRef<str>>(table: &str, requested: &[S], previous: &[S]) -> Scenario {
    if table == ENCRYPTION_SETTINGS_TABLE {
        return Scenario::IsSettingsTable;
    }

    let contains = |set: &[S]| set.iter().any(|t| t.as_ref() == table);
    match (contains(previous), contains(requested)) {
        (false, false) => Scenario::UnencryptedNoChange,
        (false, true) => Scenario::UnencryptedToEncrypted,
        (true, false) => Scenario::EncryptedToUnencrypted,
        (true, true) => Scenario::EncryptedNoChange,
    }
}
