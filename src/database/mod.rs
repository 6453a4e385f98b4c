//! charrank persistence layer.
//!
//! Provides the [`KeyValueStore`] port used by the history and favorites
//! stores, a SQLite implementation with schema migrations, and an in-memory
//! implementation.
//!
//! # Usage
//!
//! ```no_run
//! use charrank::database::{Database, KeyValueStore};
//!
//! // Open a persistent database
//! let db = Database::open("charrank.db").expect("failed to open database");
//!
//! // Or use an in-memory database for testing
//! let db = Database::open_in_memory().expect("failed to open in-memory database");
//!
//! db.set("greeting", &serde_json::json!("hello")).unwrap();
//! ```

pub mod connection;
pub mod kv_store;
pub mod migrations;

pub use connection::Database;
pub use kv_store::{KeyValueStore, MemoryStore};
