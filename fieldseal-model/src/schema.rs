use crate::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared tables of one schema version, keyed by table name.
pub type DatabaseSchema = BTreeMap<String, TableSchema>;

/// The primary key of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKey {
    pub name: String,
    /// Keys are assigned by the engine when a record omits them.
    pub auto_increment: bool,
}

/// Describes a table's structure: its primary key and index fields.
///
/// Primary key and index fields are the only fields the encryption layer
/// leaves in plaintext, so the engine can still query on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub primary_key: PrimaryKey,
    pub indexes: Vec<String>,
}

impl TableSchema {
    /// Creates a schema with a non auto-incrementing primary key.
    pub fn new(name: &str, primary_key: &str, indexes: &[&str]) -> Self {
        Self {
            name: name.into(),
            primary_key: PrimaryKey {
                name: primary_key.into(),
                auto_increment: false,
            },
            indexes: indexes.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Parses a compact store spec such as `"++id, name, age"`.
    ///
    /// The first entry names the primary key (`++` marks it auto-incrementing),
    /// the remaining entries name index fields.
    pub fn parse(name: &str, spec: &str) -> Result<Self> {
        let mut entries = spec.split(',').map(str::trim);

        let first = entries.next().unwrap_or_default();
        let (key_name, auto_increment) = match first.strip_prefix("++") {
            Some(rest) => (rest.trim(), true),
            None => (first, false),
        };
        if key_name.is_empty() {
            return Err(ModelError::InvalidStoreSpec {
                table: name.into(),
                reason: "missing primary key".into(),
            });
        }

        let mut indexes: Vec<String> = Vec::new();
        for entry in entries {
            if entry.is_empty() {
                return Err(ModelError::InvalidStoreSpec {
                    table: name.into(),
                    reason: "empty index name".into(),
                });
            }
            if entry != key_name && !indexes.iter().any(|i| i == entry) {
                indexes.push(entry.to_string());
            }
        }

        Ok(Self {
            name: name.into(),
            primary_key: PrimaryKey {
                name: key_name.into(),
                auto_increment,
            },
            indexes,
        })
    }

    /// Parses every `(table, spec)` pair into a [`DatabaseSchema`].
    pub fn parse_all<'a>(
        stores: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<DatabaseSchema> {
        stores
            .into_iter()
            .map(|(name, spec)| Ok((name.to_string(), Self::parse(name, spec)?)))
            .collect()
    }

    /// True for the primary key and every index field.
    pub fn is_plaintext_field(&self, field: &str) -> bool {
        field == self.primary_key.name || self.is_index(field)
    }

    /// True when `field` is declared as an index.
    pub fn is_index(&self, field: &str) -> bool {
        self.indexes.iter().any(|i| i == field)
    }

    /// Renders the schema back into store-spec form.
    pub fn to_spec(&self) -> String {
        let mut parts = Vec::with_capacity(self.indexes.len() + 1);
        if self.primary_key.auto_increment {
            parts.push(format!("++{}", self.primary_key.name));
        } else {
            parts.push(self.primary_key.name.clone());
        }
        parts.extend(self.indexes.iter().cloned());
        parts.join(", ")
    }
}
