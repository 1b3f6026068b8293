use crate::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The set of tables that were encrypted as of the last successful reconciliation.
///
/// Persisted in the hidden settings table. Only the most recently inserted
/// record is authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionSettings {
    /// Auto-assigned by the settings table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub tables: Vec<String>,
}

impl EncryptionSettings {
    /// Creates an unsaved settings record for `tables`.
    pub fn new(tables: Vec<String>) -> Self {
        Self { id: None, tables }
    }

    /// Reads a stored settings record.
    ///
    /// Lenient: a missing or malformed `tables` field reads as no tables, and
    /// non-string entries are ignored.
    pub fn from_record(record: &Record) -> Self {
        let id = record.get("id").and_then(Value::as_i64);
        let tables = match record.get("tables") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        Self { id, tables }
    }

    /// Converts into the record form written to the settings table.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        if let Some(id) = self.id {
            record.insert("id".into(), Value::from(id));
        }
        record.insert(
            "tables".into(),
            Value::Array(self.tables.iter().cloned().map(Value::String).collect()),
        );
        record
    }
}
