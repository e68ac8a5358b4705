//! Document store access.
//!
//! The concert database is a document store: named collections of documents,
//! each an identifier plus a JSON field record. The exporter only ever reads
//! whole collections, so the store surface is a single method.
//!
//! ## SQLite snapshot schema
//!
//! ```sql
//! CREATE TABLE documents (
//!     collection TEXT NOT NULL,
//!     id         TEXT NOT NULL,
//!     data       TEXT NOT NULL,   -- JSON object
//!     PRIMARY KEY (collection, id)
//! );
//! ```

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OpenFlags};
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

pub const CONCERTS: &str = "concerts";
pub const SETLISTS: &str = "setlists";
pub const ARTISTS: &str = "artists";
pub const VENUES: &str = "venues";
pub const CONCERT_PHOTOS: &str = "concert_photos";

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    data TEXT NOT NULL,
    PRIMARY KEY (collection, id)
);";

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

pub trait DocumentStore {
    /// All documents of a collection, ordered by identifier. An unknown
    /// collection is empty.
    fn documents(&self, collection: &str) -> Result<Vec<Document>>;
}

/// Read access to a SQLite snapshot of the concert database.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open an existing snapshot read-only.
    pub fn open(path: &Path) -> rusqlite::Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        // Fails early when the file is not a snapshot at all.
        conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get::<_, i64>(0))?;
        Ok(Self { conn })
    }

    /// Create (or open for writing) a snapshot, used to seed fixtures.
    pub fn create(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to create snapshot {}", path.display()))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn put(&self, collection: &str, id: &str, data: &Value) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO documents (collection, id, data) VALUES (?1, ?2, ?3)",
            params![collection, id, data.to_string()],
        )?;
        Ok(())
    }

    pub fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        Ok(())
    }
}

impl DocumentStore for SqliteStore {
    fn documents(&self, collection: &str) -> Result<Vec<Document>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, data FROM documents WHERE collection = ?1 ORDER BY id")?;
        let mut rows = stmt.query([collection])?;

        let mut docs = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let raw: String = row.get(1)?;
            let data = match serde_json::from_str(&raw) {
                Ok(data) => data,
                Err(err) => {
                    warn!(collection, id = %id, error = %err, "malformed document, using defaults");
                    Value::Null
                }
            };
            docs.push(Document { id, data });
        }
        Ok(docs)
    }
}

/// In-memory document store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: FxHashMap<String, BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, collection: &str, id: &str, data: Value) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
    }

    pub fn remove(&mut self, collection: &str, id: &str) -> Option<Value> {
        self.collections.get_mut(collection)?.remove(id)
    }
}

impl DocumentStore for MemoryStore {
    fn documents(&self, collection: &str) -> Result<Vec<Document>> {
        Ok(self
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}
