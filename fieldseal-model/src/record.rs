use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A document stored in a table.
///
/// Field values are arbitrary JSON. Which fields are the primary key and
/// which are indexed is decided by the table's [`TableSchema`](crate::TableSchema).
pub type Record = serde_json::Map<String, Value>;

/// A single field change on the update path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldUpdate {
    /// Write the value, replacing whatever the field held.
    Set(Value),
    /// Remove the field from the stored record.
    ///
    /// This is how a hook asks the engine's change tracking to drop a field
    /// instead of deleting it from a record itself.
    Unset,
}

/// Field changes applied by an update, keyed by field name.
pub type Modifications = BTreeMap<String, FieldUpdate>;

impl FieldUpdate {
    /// Returns the value being written, if any.
    pub fn value(&self) -> Option<&Value> {
        match self {
            FieldUpdate::Set(value) => Some(value),
            FieldUpdate::Unset => None,
        }
    }
}

impl From<Value> for FieldUpdate {
    fn from(value: Value) -> Self {
        FieldUpdate::Set(value)
    }
}

/// Builds the modifications that write every field of `changes`.
pub fn to_modifications(changes: Record) -> Modifications {
    changes
        .into_iter()
        .map(|(field, value)| (field, FieldUpdate::Set(value)))
        .collect()
}

/// Applies `modifications` on top of `record`.
///
/// `Set` inserts or replaces the field, `Unset` removes it.
pub fn apply_modifications(record: &mut Record, modifications: &Modifications) {
    for (field, update) in modifications {
        match update {
            FieldUpdate::Set(value) => {
                record.insert(field.clone(), value.clone());
            }
            FieldUpdate::Unset => {
                record.remove(field);
            }
        }
    }
}
