#![allow(dead_code)]

use fieldseal_crypto::{EncryptionProvider, PassthroughProvider, ProviderError, ProviderResult};
use fieldseal_middleware::{install, Reconciler};
use fieldseal_model::{DatabaseSchema, Record, TableSchema};
use fieldseal_storage::{Database, MemoryBackend, MemoryDatabase};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub const DB: &str = "fieldseal-test";

pub fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

pub fn camilla() -> Record {
    record(json!({
        "name": "Camilla",
        "age": 25,
        "street": "East 13:th Street",
        "picture": "camilla.png",
    }))
}

pub fn friends_schema() -> DatabaseSchema {
    TableSchema::parse_all([("friends", "++id, name, age")]).unwrap()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Opens an encrypted connection declaring `schema` as `version`.
pub async fn open_encrypted(
    backend: &Arc<MemoryBackend>,
    version: u32,
    schema: DatabaseSchema,
    provider: Arc<dyn EncryptionProvider>,
    tables: &[&str],
) -> (MemoryDatabase, Arc<Reconciler>) {
    let db = backend.connect(DB);
    db.version(version, schema).unwrap();
    let reconciler = install(&db, provider, tables.iter().copied()).unwrap();
    fieldseal_middleware::open(&db).await.unwrap();
    (db, reconciler)
}

/// Opens a connection without middleware, exposing stored records as they are.
pub async fn open_raw(backend: &Arc<MemoryBackend>) -> MemoryDatabase {
    let db = backend.connect(DB);
    db.open().await.unwrap();
    db
}

pub fn passthrough() -> Arc<dyn EncryptionProvider> {
    Arc::new(PassthroughProvider)
}

/// Passthrough provider that can be switched into failing and counts calls.
#[derive(Default)]
pub struct FlakyProvider {
    pub failing: AtomicBool,
    pub encrypt_calls: AtomicUsize,
    pub decrypt_calls: AtomicUsize,
}

impl FlakyProvider {
    pub fn failing() -> Self {
        let provider = Self::default();
        provider.failing.store(true, Ordering::SeqCst);
        provider
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> ProviderResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(ProviderError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl EncryptionProvider for FlakyProvider {
    fn encrypt(&self, plain: &Record) -> ProviderResult<Vec<u8>> {
        self.encrypt_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        PassthroughProvider.encrypt(plain)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> ProviderResult<Record> {
        self.decrypt_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        PassthroughProvider.decrypt(ciphertext)
    }
}
