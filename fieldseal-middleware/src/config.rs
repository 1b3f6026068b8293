//! Middleware configuration.

use crate::error::EncryptResult;
use serde::{Deserialize, Serialize};

/// Which tables the middleware should keep encrypted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncryptionConfig {
    /// Names of the tables to encrypt. Tables not listed stay (or become) plaintext.
    #[serde(default)]
    pub tables: Vec<String>,
}

impl EncryptionConfig {
    pub fn new<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Self::default();
        for table in tables {
            let table = table.into();
            if !config.tables.contains(&table) {
                config.tables.push(table);
            }
        }
        config
    }

    /// Parses a JSON document such as `{"tables": ["friends"]}`.
    pub fn from_json(json: &str) -> EncryptResult<Self> {
        let parsed: Self = serde_json::from_str(json)?;
        Ok(Self::new(parsed.tables))
    }
}
