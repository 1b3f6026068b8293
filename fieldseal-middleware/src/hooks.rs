//! Binds the codec to a table's create, update and read interception points.

use crate::codec::{Codec, WipeMode};
use crate::error::EncryptError;
use fieldseal_model::{apply_modifications, Modifications, Record, TableSchema, ENCRYPTED_DATA_KEY};
use fieldseal_storage::{BoxError, Table, TableHooks};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, trace};

/// True when an update touches nothing but the ciphertext field.
///
/// The middleware's own re-encryption is such an update. Intervening again
/// would re-enter the hook forever.
pub fn is_ciphertext_only(modifications: &Modifications) -> bool {
    modifications.keys().all(|field| field == ENCRYPTED_DATA_KEY)
}

/// Hooks that keep one table encrypted at rest.
#[derive(Debug, Clone)]
pub struct EncryptionHooks {
    schema: TableSchema,
    codec: Codec,
}

impl EncryptionHooks {
    pub fn new(schema: TableSchema, codec: Codec) -> Self {
        Self { schema, codec }
    }
}

fn boxed(err: EncryptError) -> BoxError {
    Box::new(err)
}

impl TableHooks for EncryptionHooks {
    fn on_create(&self, record: &mut Record) -> Result<(), BoxError> {
        self.codec.encrypt(&self.schema, record).map_err(boxed)
    }

    fn on_update(
        &self,
        modifications: &Modifications,
        _key: &Value,
        current: &Record,
    ) -> Result<Option<Modifications>, BoxError> {
        if is_ciphertext_only(modifications) {
            trace!("{}: ciphertext-only update, not intervening", self.schema.name);
            return Ok(None);
        }

        let mut merged = self
            .codec
            .decrypt(current.clone(), WipeMode::MarkAbsent)
            .map_err(boxed)?;
        apply_modifications(&mut merged, modifications);
        let replacement = self
            .codec
            .encrypt_for_update(&self.schema, &merged)
            .map_err(boxed)?;
        Ok(Some(replacement))
    }

    fn on_read(&self, record: Record) -> Result<Record, BoxError> {
        self.codec.decrypt(record, WipeMode::Delete).map_err(boxed)
    }
}

/// Registers [`EncryptionHooks`] on `table` for this connection.
pub fn install_hooks(table: &dyn Table, codec: &Codec) {
    info!("Installing hooks for {}", table.name());
    let hooks = EncryptionHooks::new(table.schema().clone(), codec.clone());
    table.set_hooks(Arc::new(hooks));
}
