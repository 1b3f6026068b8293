//! Record transformation between plaintext and stored form.
//!
//! A stored record of an encrypted table keeps its primary key and index
//! fields in plaintext. Every field is sealed together into the ciphertext
//! field [`ENCRYPTED_DATA_KEY`], encoded as standard base64.

use crate::error::{EncryptError, EncryptResult};
use base64::{engine::general_purpose::STANDARD, Engine};
use fieldseal_crypto::EncryptionProvider;
use fieldseal_model::{FieldUpdate, Modifications, Record, TableSchema, ENCRYPTED_DATA_KEY};
use serde_json::Value;
use std::sync::Arc;

/// How [`Codec::decrypt`] removes the ciphertext field from its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WipeMode {
    /// Remove the field. Used on reads.
    Delete,
    /// Keep the field with a `null` value so the update path can emit an
    /// explicit removal for the engine's change tracking.
    MarkAbsent,
}

/// Returns true when `record` carries a non-empty ciphertext field.
pub fn is_encrypted(record: &Record) -> bool {
    record.get(ENCRYPTED_DATA_KEY).is_some_and(is_truthy)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Every field except the ciphertext field.
fn side_buffer(record: &Record) -> Record {
    record
        .iter()
        .filter(|(field, _)| field.as_str() != ENCRYPTED_DATA_KEY)
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect()
}

/// Encrypts and decrypts records through an injected provider.
#[derive(Clone)]
pub struct Codec {
    provider: Arc<dyn EncryptionProvider>,
}

impl Codec {
    pub fn new(provider: Arc<dyn EncryptionProvider>) -> Self {
        Self { provider }
    }

    fn seal(&self, plain: &Record) -> EncryptResult<Value> {
        let bytes = self.provider.encrypt(plain)?;
        Ok(Value::String(STANDARD.encode(bytes)))
    }

    fn open(&self, ciphertext: &Value) -> EncryptResult<Record> {
        let encoded = ciphertext.as_str().ok_or_else(|| {
            EncryptError::InvalidCiphertext(format!("expected a string, found {ciphertext}"))
        })?;
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| EncryptError::InvalidCiphertext(format!("invalid base64: {e}")))?;
        Ok(self.provider.decrypt(&bytes)?)
    }

    /// Turns `record` into its stored form in place.
    ///
    /// Used on the create path, where the record is owned by the write. A
    /// record that is already in stored form is opened first, so its sealed
    /// fields are carried into the new ciphertext together with any changed
    /// plaintext fields.
    pub fn encrypt(&self, schema: &TableSchema, record: &mut Record) -> EncryptResult<()> {
        let plain = if is_encrypted(record) {
            self.decrypt(record.clone(), WipeMode::Delete)?
        } else {
            side_buffer(record)
        };
        let ciphertext = self.seal(&plain)?;
        record.retain(|field, _| schema.is_plaintext_field(field));
        record.insert(ENCRYPTED_DATA_KEY.to_string(), ciphertext);
        Ok(())
    }

    /// Builds the modifications that replace a stored record with the
    /// encrypted form of `merged`, leaving `merged` untouched.
    ///
    /// Non-index fields come out as [`FieldUpdate::Unset`] so the engine
    /// removes any plaintext copy.
    pub fn encrypt_for_update(
        &self,
        schema: &TableSchema,
        merged: &Record,
    ) -> EncryptResult<Modifications> {
        let ciphertext = self.seal(&side_buffer(merged))?;

        let mut modifications: Modifications = merged
            .iter()
            .filter(|(field, _)| field.as_str() != ENCRYPTED_DATA_KEY)
            .map(|(field, value)| {
                let update = if schema.is_plaintext_field(field) {
                    FieldUpdate::Set(value.clone())
                } else {
                    FieldUpdate::Unset
                };
                (field.clone(), update)
            })
            .collect();
        modifications.insert(ENCRYPTED_DATA_KEY.to_string(), FieldUpdate::Set(ciphertext));
        Ok(modifications)
    }

    /// Restores the plaintext record from its stored form.
    ///
    /// Records without a ciphertext field are returned unchanged. Plaintext
    /// fields of the stored record take precedence over the sealed copies.
    pub fn decrypt(&self, record: Record, wipe: WipeMode) -> EncryptResult<Record> {
        let ciphertext = match record.get(ENCRYPTED_DATA_KEY) {
            Some(value) if is_truthy(value) => value,
            _ => return Ok(record),
        };

        let mut result = self.open(ciphertext)?;
        for (field, value) in record {
            if field != ENCRYPTED_DATA_KEY {
                result.insert(field, value);
            }
        }
        match wipe {
            WipeMode::Delete => {
                result.remove(ENCRYPTED_DATA_KEY);
            }
            WipeMode::MarkAbsent => {
                result.insert(ENCRYPTED_DATA_KEY.to_string(), Value::Null);
            }
        }
        Ok(result)
    }
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec").finish_non_exhaustive()
    }
}
