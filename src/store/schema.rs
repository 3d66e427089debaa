//! Session store schema

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS session_kv (
    key TEXT PRIMARY KEY,
    value BLOB NOT NULL,
    updated_at TEXT NOT NULL
);
";

/// Upsert a single key
pub const UPSERT_VALUE: &str = r"
INSERT INTO session_kv (key, value, updated_at) VALUES (?1, ?2, ?3)
ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
";

pub const SELECT_VALUE: &str = "SELECT value FROM session_kv WHERE key = ?1";
