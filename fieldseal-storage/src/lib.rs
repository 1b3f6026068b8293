//! Storage engine interface for fieldseal.
//!
//! The encryption middleware does not own tables, schemas or query execution.
//! It talks to a document store through the traits in this crate:
//!
//! - [`Database`]: a connection with a versioned schema, an open lifecycle,
//!   pre-open [`SchemaAugmenter`]s and post-open [`ReadyHandler`]s
//! - [`Table`]: record CRUD plus the bulk `modify_all` primitive
//! - [`TableHooks`]: per-table create/update/read interception
//!
//! [`MemoryBackend`] and [`MemoryDatabase`] implement the interface in memory.
//! Several connections can open the same named database on one backend, which
//! is how tests inspect the raw stored records behind an encrypted connection.
//!
//! # Example
//!
//! ```
//! use fieldseal_model::TableSchema;
//! use fieldseal_storage::{Database, MemoryBackend};
//! use serde_json::json;
//!
//! # tokio_test_block_on(async {
//! let backend = MemoryBackend::new();
//! let db = backend.connect("app");
//! db.version(1, TableSchema::parse_all([("friends", "++id, name")]).unwrap()).unwrap();
//! db.open().await.unwrap();
//!
//! let friends = db.table("friends").unwrap();
//! let id = friends.add(json!({"name": "Camilla"}).as_object().cloned().unwrap()).await.unwrap();
//! assert_eq!(id, json!(1));
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

mod engine;
mod error;
mod key;
mod memory;

pub use engine::{BoxError, Database, ReadyHandler, SchemaAugmenter, Table, TableHooks};
pub use error::{StorageError, StorageResult};
pub use memory::{MemoryBackend, MemoryDatabase, MemoryTable};
