//! Transparent field-level encryption for fieldseal document stores.
//!
//! Installing the middleware on a connection does three things:
//!
//! 1. Adds the hidden [`ENCRYPTION_SETTINGS_TABLE`] to every declared schema
//!    version, through a [`SchemaAugmenter`](fieldseal_storage::SchemaAugmenter).
//! 2. On open, reconciles stored data with the requested tables: newly
//!    requested tables are encrypted in bulk, tables no longer requested are
//!    decrypted in bulk, and the settings table records the new set.
//! 3. Registers create, update and read hooks on every encrypted table so
//!    application code keeps working with plaintext records.
//!
//! Encrypted records keep their primary key and index fields in plaintext so
//! they stay queryable. All other fields live only inside the ciphertext field
//! [`ENCRYPTED_DATA_KEY`].
//!
//! # Example
//!
//! ```
//! use fieldseal_crypto::{ChaChaProvider, RecordKey};
//! use fieldseal_middleware::install;
//! use fieldseal_model::TableSchema;
//! use fieldseal_storage::{Database, MemoryBackend};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # tokio_test_block_on(async {
//! let backend = MemoryBackend::new();
//! let db = backend.connect("app");
//! db.version(1, TableSchema::parse_all([("friends", "++id, name")]).unwrap()).unwrap();
//! install(&db, Arc::new(ChaChaProvider::new(RecordKey::generate())), ["friends"]).unwrap();
//! fieldseal_middleware::open(&db).await.unwrap();
//!
//! let friends = db.table("friends").unwrap();
//! let id = friends
//!     .add(json!({"name": "Camilla", "street": "East 13:th Street"}).as_object().cloned().unwrap())
//!     .await
//!     .unwrap();
//! let friend = friends.get(&id).await.unwrap().unwrap();
//! assert_eq!(friend["street"], "East 13:th Street");
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

mod augmenter;
mod codec;
mod config;
mod error;
mod hooks;
mod reconcile;
mod scenario;
mod settings;

pub use augmenter::{ensure_not_open, SettingsTableAugmenter};
pub use codec::{is_encrypted, Codec, WipeMode};
pub use config::EncryptionConfig;
pub use error::{EncryptError, EncryptResult};
pub use hooks::{install_hooks, is_ciphertext_only, EncryptionHooks};
pub use reconcile::{ReconcileReport, Reconciler, TableOutcome};
pub use scenario::{classify, Scenario};
pub use settings::SettingsStore;

pub use fieldseal_model::{ENCRYPTED_DATA_KEY, ENCRYPTION_SETTINGS_TABLE};

use fieldseal_crypto::EncryptionProvider;
use fieldseal_storage::Database;
use std::sync::Arc;
use tracing::debug;

/// Installs the middleware on a connection that has not been opened yet.
///
/// `tables` names the tables to keep encrypted. Fails with
/// [`EncryptError::DatabaseAlreadyOpen`] without touching `db` when its
/// schema can no longer change.
///
/// The returned [`Reconciler`] is already registered as a ready handler and
/// exposes the report of its latest pass.
pub fn install<I, S>(
    db: &dyn Database,
    provider: Arc<dyn EncryptionProvider>,
    tables: I,
) -> EncryptResult<Arc<Reconciler>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    install_with_config(db, provider, EncryptionConfig::new(tables))
}

/// Same as [`install`], with the table list taken from `config`.
pub fn install_with_config(
    db: &dyn Database,
    provider: Arc<dyn EncryptionProvider>,
    config: EncryptionConfig,
) -> EncryptResult<Arc<Reconciler>> {
    ensure_not_open(db)?;
    let augmenter = SettingsTableAugmenter::new()?;

    debug!("Installing encryption on {} for {:?}", db.name(), config.tables);
    db.add_schema_augmenter(Arc::new(augmenter));
    let reconciler = Arc::new(Reconciler::new(Codec::new(provider), config.tables));
    db.on_ready(reconciler.clone());
    Ok(reconciler)
}

/// Opens `db`, returning a failed reconciliation as the [`EncryptError`]
/// that caused it.
pub async fn open(db: &dyn Database) -> EncryptResult<()> {
    Ok(db.open().await?)
}
