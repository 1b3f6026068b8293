//! In-memory storage engine.

use crate::engine::{BoxError, Database, ReadyHandler, SchemaAugmenter, Table, TableHooks};
use crate::error::{StorageError, StorageResult};
use crate::key::RowKey;
use async_trait::async_trait;
use fieldseal_model::{apply_modifications, DatabaseSchema, Modifications, Record, TableSchema};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct StoredTable {
    schema: TableSchema,
    rows: BTreeMap<RowKey, Record>,
    next_id: i64,
}

impl StoredTable {
    fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Reads the primary key of `record`, assigning the next id when the key
    /// is auto-incrementing and missing.
    fn assign_key(&mut self, record: &mut Record) -> StorageResult<RowKey> {
        let pk = &self.schema.primary_key;
        match record.get(&pk.name) {
            Some(value) => {
                let key = RowKey::from_value(value).ok_or_else(|| {
                    StorageError::InvalidKey(format!("{}.{} = {}", self.schema.name, pk.name, value))
                })?;
                if let RowKey::Number(n) = key {
                    self.next_id = self.next_id.max(n.saturating_add(1));
                }
                Ok(key)
            }
            None if pk.auto_increment => {
                let key = RowKey::Number(self.next_id);
                self.next_id += 1;
                record.insert(pk.name.clone(), key.to_value());
                Ok(key)
            }
            None => Err(StorageError::InvalidKey(format!(
                "{}: record has no {:?} field",
                self.schema.name, pk.name
            ))),
        }
    }
}

#[derive(Debug, Default)]
struct StoredDatabase {
    version: u32,
    tables: BTreeMap<String, StoredTable>,
}

/// Process-local storage shared by every connection created from it.
///
/// Data outlives connections: closing and reopening a database, or opening
/// a second connection to it, sees the same records.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    databases: Mutex<HashMap<String, StoredDatabase>>,
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates a closed connection to the database `name`.
    pub fn connect(self: &Arc<Self>, name: &str) -> MemoryDatabase {
        MemoryDatabase {
            name: name.to_string(),
            backend: Arc::clone(self),
            versions: RwLock::new(BTreeMap::new()),
            augmenters: RwLock::new(Vec::new()),
            ready_handlers: RwLock::new(Vec::new()),
            state: Arc::new(ConnectionState::default()),
        }
    }

    /// Stored schema version of `name`, if the database exists.
    pub fn stored_version(&self, name: &str) -> Option<u32> {
        lock(&self.databases).get(name).map(|db| db.version)
    }

    /// Brings the stored database in line with the declared schema and
    /// returns the physical schema the connection will see.
    fn attach(
        &self,
        name: &str,
        declared: Option<(u32, DatabaseSchema)>,
    ) -> StorageResult<DatabaseSchema> {
        let mut databases = lock(&self.databases);
        let stored = databases.entry(name.to_string()).or_default();

        if let Some((version, schema)) = declared {
            if version < stored.version {
                return Err(StorageError::VersionMismatch {
                    declared: version,
                    stored: stored.version,
                });
            }
            if version > stored.version {
                info!(
                    "Upgrading database {} from version {} to {}",
                    name, stored.version, version
                );
                stored.tables.retain(|table, _| schema.contains_key(table));
                for (table, table_schema) in schema {
                    stored
                        .tables
                        .entry(table)
                        .and_modify(|t| t.schema = table_schema.clone())
                        .or_insert_with(|| StoredTable::new(table_schema));
                }
                stored.version = version;
            }
        }

        Ok(stored
            .tables
            .iter()
            .map(|(table, t)| (table.clone(), t.schema.clone()))
            .collect())
    }

    fn with_table<R>(
        &self,
        db: &str,
        table: &str,
        f: impl FnOnce(&mut StoredTable) -> StorageResult<R>,
    ) -> StorageResult<R> {
        let mut databases = lock(&self.databases);
        let stored = databases
            .get_mut(db)
            .and_then(|d| d.tables.get_mut(table))
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;
        f(stored)
    }
}

#[derive(Default)]
struct ConnectionState {
    /// Physical schema while open.
    open: RwLock<Option<DatabaseSchema>>,
    hooks: RwLock<HashMap<String, Arc<dyn TableHooks>>>,
}

impl ConnectionState {
    fn is_open(&self) -> bool {
        read(&self.open).is_some()
    }
}

/// A connection to a database held by a [`MemoryBackend`].
pub struct MemoryDatabase {
    name: String,
    backend: Arc<MemoryBackend>,
    versions: RwLock<BTreeMap<u32, DatabaseSchema>>,
    augmenters: RwLock<Vec<Arc<dyn SchemaAugmenter>>>,
    ready_handlers: RwLock<Vec<Arc<dyn ReadyHandler>>>,
    state: Arc<ConnectionState>,
}

impl MemoryDatabase {
    /// Declared schema after augmentation, merged across versions.
    fn declared_schema(&self) -> Option<(u32, DatabaseSchema)> {
        let versions = read(&self.versions);
        let augmenters = read(&self.augmenters);
        let latest = *versions.keys().next_back()?;

        let mut merged = DatabaseSchema::new();
        for (version, tables) in versions.iter() {
            let mut tables = tables.clone();
            for augmenter in augmenters.iter() {
                augmenter.augment(*version, &mut tables);
            }
            merged.extend(tables);
        }
        Some((latest, merged))
    }

    fn make_table(&self, schema: TableSchema) -> Arc<dyn Table> {
        Arc::new(MemoryTable {
            db: self.name.clone(),
            schema,
            backend: Arc::clone(&self.backend),
            state: Arc::clone(&self.state),
        })
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn verno(&self) -> u32 {
        read(&self.versions).keys().next_back().copied().unwrap_or(0)
    }

    fn is_open(&self) -> bool {
        self.state.is_open()
    }

    fn version(&self, version: u32, tables: DatabaseSchema) -> StorageResult<()> {
        if self.is_open() {
            return Err(StorageError::DatabaseOpen(self.name.clone()));
        }
        write(&self.versions).entry(version).or_default().extend(tables);
        Ok(())
    }

    fn add_schema_augmenter(&self, augmenter: Arc<dyn SchemaAugmenter>) {
        write(&self.augmenters).push(augmenter);
    }

    fn on_ready(&self, handler: Arc<dyn ReadyHandler>) {
        write(&self.ready_handlers).push(handler);
    }

    async fn open(&self) -> StorageResult<()> {
        if self.is_open() {
            return Ok(());
        }

        let physical = self.backend.attach(&self.name, self.declared_schema())?;
        debug!("Opened database {} with {} tables", self.name, physical.len());
        *write(&self.state.open) = Some(physical);

        let handlers = read(&self.ready_handlers).clone();
        for handler in handlers {
            if let Err(e) = handler.on_ready(self).await {
                self.close();
                return Err(StorageError::Ready(e));
            }
        }
        Ok(())
    }

    fn close(&self) {
        *write(&self.state.open) = None;
    }

    fn tables(&self) -> Vec<Arc<dyn Table>> {
        let schemas: Vec<TableSchema> = match read(&self.state.open).as_ref() {
            Some(physical) => physical.values().cloned().collect(),
            None => return Vec::new(),
        };
        schemas.into_iter().map(|s| self.make_table(s)).collect()
    }

    fn table(&self, name: &str) -> StorageResult<Arc<dyn Table>> {
        let schema = match read(&self.state.open).as_ref() {
            Some(physical) => physical
                .get(name)
                .cloned()
                .ok_or_else(|| StorageError::TableNotFound(name.to_string()))?,
            None => return Err(StorageError::DatabaseClosed(self.name.clone())),
        };
        Ok(self.make_table(schema))
    }
}

/// A table handle bound to one [`MemoryDatabase`] connection.
pub struct MemoryTable {
    db: String,
    schema: TableSchema,
    backend: Arc<MemoryBackend>,
    state: Arc<ConnectionState>,
}

impl MemoryTable {
    fn ensure_open(&self) -> StorageResult<()> {
        if self.state.is_open() {
            Ok(())
        } else {
            Err(StorageError::DatabaseClosed(self.db.clone()))
        }
    }

    fn with_table<R>(
        &self,
        f: impl FnOnce(&mut StoredTable) -> StorageResult<R>,
    ) -> StorageResult<R> {
        self.ensure_open()?;
        self.backend.with_table(&self.db, &self.schema.name, f)
    }

    fn hooks(&self) -> Option<Arc<dyn TableHooks>> {
        read(&self.state.hooks).get(&self.schema.name).cloned()
    }

    fn key_of(&self, value: &Value) -> StorageResult<RowKey> {
        RowKey::from_value(value)
            .ok_or_else(|| StorageError::InvalidKey(format!("{}: {}", self.schema.name, value)))
    }

    fn read_hooked(&self, record: Record) -> StorageResult<Record> {
        match self.hooks() {
            Some(hooks) => hooks.on_read(record).map_err(StorageError::Callback),
            None => Ok(record),
        }
    }

    fn read_hooked_opt(&self, record: Option<Record>) -> StorageResult<Option<Record>> {
        record.map(|r| self.read_hooked(r)).transpose()
    }

    fn store(&self, mut record: Record, overwrite: bool) -> StorageResult<Value> {
        let key = self.with_table(|t| t.assign_key(&mut record))?;
        if let Some(hooks) = self.hooks() {
            hooks.on_create(&mut record).map_err(StorageError::Callback)?;
        }
        record.insert(self.schema.primary_key.name.clone(), key.to_value());

        self.with_table(|t| {
            if !overwrite && t.rows.contains_key(&key) {
                return Err(StorageError::ConstraintViolation(format!(
                    "{}: key {} already exists",
                    t.schema.name,
                    key.to_value()
                )));
            }
            t.rows.insert(key.clone(), record);
            Ok(())
        })?;
        Ok(key.to_value())
    }
}

#[async_trait]
impl Table for MemoryTable {
    fn name(&self) -> &str {
        &self.schema.name
    }

    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    async fn add(&self, record: Record) -> StorageResult<Value> {
        self.store(record, false)
    }

    async fn put(&self, record: Record) -> StorageResult<Value> {
        self.store(record, true)
    }

    async fn get(&self, key: &Value) -> StorageResult<Option<Record>> {
        let key = self.key_of(key)?;
        let raw = self.with_table(|t| Ok(t.rows.get(&key).cloned()))?;
        self.read_hooked_opt(raw)
    }

    async fn get_by(&self, field: &str, value: &Value) -> StorageResult<Option<Record>> {
        if field == self.schema.primary_key.name {
            return self.get(value).await;
        }
        if !self.schema.is_index(field) {
            return Err(StorageError::NotIndexed {
                table: self.schema.name.clone(),
                field: field.to_string(),
            });
        }
        let raw = self.with_table(|t| {
            Ok(t.rows
                .values()
                .find(|r| r.get(field) == Some(value))
                .cloned())
        })?;
        self.read_hooked_opt(raw)
    }

    async fn update(&self, key: &Value, changes: Modifications) -> StorageResult<bool> {
        let row_key = self.key_of(key)?;
        let Some(current) = self.with_table(|t| Ok(t.rows.get(&row_key).cloned()))? else {
            return Ok(false);
        };

        let mut modifications = changes;
        if let Some(hooks) = self.hooks() {
            let extra = hooks
                .on_update(&modifications, key, &current)
                .map_err(StorageError::Callback)?;
            if let Some(extra) = extra {
                modifications.extend(extra);
            }
        }

        let mut next = current;
        apply_modifications(&mut next, &modifications);
        next.insert(self.schema.primary_key.name.clone(), row_key.to_value());

        self.with_table(|t| {
            t.rows.insert(row_key, next);
            Ok(true)
        })
    }

    async fn delete(&self, key: &Value) -> StorageResult<bool> {
        let key = self.key_of(key)?;
        self.with_table(|t| Ok(t.rows.remove(&key).is_some()))
    }

    async fn to_vec(&self) -> StorageResult<Vec<Record>> {
        let raw: Vec<Record> = self.with_table(|t| Ok(t.rows.values().cloned().collect()))?;
        raw.into_iter().map(|r| self.read_hooked(r)).collect()
    }

    async fn count(&self) -> StorageResult<usize> {
        self.with_table(|t| Ok(t.rows.len()))
    }

    async fn last(&self) -> StorageResult<Option<Record>> {
        let raw = self.with_table(|t| Ok(t.rows.values().next_back().cloned()))?;
        self.read_hooked_opt(raw)
    }

    async fn clear(&self) -> StorageResult<()> {
        self.with_table(|t| {
            t.rows.clear();
            Ok(())
        })
    }

    async fn modify_all(
        &self,
        f: &(dyn Fn(Record) -> Result<Record, BoxError> + Send + Sync),
    ) -> StorageResult<usize> {
        let snapshot: Vec<(RowKey, Record)> = self.with_table(|t| {
            Ok(t.rows
                .iter()
                .map(|(k, r)| (k.clone(), r.clone()))
                .collect())
        })?;

        let pk = &self.schema.primary_key.name;
        let mut rewritten = Vec::new();
        for (key, record) in snapshot {
            let mut next = f(record.clone()).map_err(StorageError::Callback)?;
            next.insert(pk.clone(), key.to_value());
            if next != record {
                rewritten.push((key, next));
            }
        }

        let changed = rewritten.len();
        self.with_table(|t| {
            for (key, record) in rewritten {
                t.rows.insert(key, record);
            }
            Ok(())
        })?;
        debug!("Rewrote {} records in {}", changed, self.schema.name);
        Ok(changed)
    }

    fn set_hooks(&self, hooks: Arc<dyn TableHooks>) {
        write(&self.state.hooks).insert(self.schema.name.clone(), hooks);
    }
}
