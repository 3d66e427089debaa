//! Session-scoped key-value storage
//!
//! The conversation history is kept under a single fixed key as an opaque
//! byte payload. The store never interprets the bytes.

mod schema;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use schema::{SCHEMA, SELECT_VALUE, UPSERT_VALUE};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Store lock poisoned")]
    Poisoned,
    #[error("Store rejected write: {0}")]
    Rejected(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Scoped key-value capability injected into the runtime
pub trait SessionStore: Send + Sync {
    /// Read the raw payload stored under `key`
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Replace the payload stored under `key`
    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()>;
}

impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        (**self).set(key, value)
    }
}

/// Process-local store; lives exactly as long as the value
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    /// Maximum payload size per key, like a browser storage quota
    quota: Option<usize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)] // API completeness
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: Arc::default(),
            quota: Some(quota),
        }
    }

    fn entries(&self) -> StoreResult<MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.entries.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl SessionStore for InMemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        if let Some(quota) = self.quota {
            if value.len() > quota {
                return Err(StoreError::Rejected(format!(
                    "payload of {} bytes exceeds quota of {quota}",
                    value.len()
                )));
            }
        }
        self.entries()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Thread-safe sqlite-backed store handle
#[derive(Clone)]
pub struct SqliteSessionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSessionStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        Self::init(Connection::open(path)?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl SessionStore for SqliteSessionStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let conn = self.conn()?;
        let value = conn
            .query_row(SELECT_VALUE, params![key], |row| row.get::<_, Vec<u8>>(0))
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(UPSERT_VALUE, params![key, value, Utc::now().to_rfc3339()])?;
        Ok(())
    }
}
