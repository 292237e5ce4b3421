//! Persisted client state: a cookie jar and a key/value item store.

use crate::error::{ClientError, Result};
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Arc;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Timestamp helper.
pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// SQLite-backed storage shared by clones.
#[derive(Clone)]
pub struct Storage {
    conn: Arc<Mutex<Connection>>,
}

impl Storage {
    /// Open or create storage at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| ClientError::Storage(format!("Failed to open storage: {}", e)))?;

        let storage = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        storage.initialize_schema()?;
        Ok(storage)
    }

    /// Open in-memory storage (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ClientError::Storage(format!("Failed to open storage: {}", e)))?;

        let storage = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        storage.initialize_schema()?;
        Ok(storage)
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cookies (
                name TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS items (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_cookies_expires ON cookies(expires_at);
            "#,
        )
        .map_err(|e| ClientError::Storage(format!("Failed to initialize schema: {}", e)))?;

        Ok(())
    }

    /// Run raw SQL against the store.
    #[cfg(test)]
    pub(crate) fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn
            .lock()
            .execute_batch(sql)
            .map_err(|e| ClientError::Storage(format!("Failed to execute batch: {}", e)))
    }

    // ========== COOKIES ==========

    /// Set a cookie that expires after `days`.
    pub fn set_cookie(&self, name: &str, value: &str, days: u32) -> Result<()> {
        let expires_at = now_timestamp() + i64::from(days) * SECONDS_PER_DAY;
        self.set_cookie_until(name, value, expires_at)
    }

    /// Set a cookie with an absolute expiry timestamp.
    pub fn set_cookie_until(&self, name: &str, value: &str, expires_at: i64) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO cookies (name, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
            params![name, value, expires_at],
        )
        .map_err(|e| ClientError::Storage(format!("Failed to set cookie: {}", e)))?;
        Ok(())
    }

    /// Get a cookie value. Expired cookies are removed and reported as missing.
    pub fn get_cookie(&self, name: &str) -> Result<Option<String>> {
        let found = {
            let conn = self.conn.lock();
            conn.query_row(
                "SELECT value, expires_at FROM cookies WHERE name = ?1",
                params![name],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()
            .map_err(|e| ClientError::Storage(format!("Failed to get cookie: {}", e)))?
        };

        match found {
            Some((_, expires_at)) if expires_at <= now_timestamp() => {
                tracing::debug!(cookie = name, "Dropping expired cookie");
                self.remove_cookie(name)?;
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value)),
            None => Ok(None),
        }
    }

    /// Remove a cookie.
    pub fn remove_cookie(&self, name: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM cookies WHERE name = ?1", params![name])
            .map_err(|e| ClientError::Storage(format!("Failed to remove cookie: {}", e)))?;
        Ok(())
    }

    /// Delete every expired cookie, returning how many were removed.
    pub fn purge_expired_cookies(&self) -> Result<usize> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM cookies WHERE expires_at <= ?1",
            params![now_timestamp()],
        )
        .map_err(|e| ClientError::Storage(format!("Failed to purge cookies: {}", e)))
    }

    // ========== ITEMS ==========

    /// Store an item.
    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO items (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now_timestamp()],
        )
        .map_err(|e| ClientError::Storage(format!("Failed to set item: {}", e)))?;
        Ok(())
    }

    /// Read an item.
    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT value FROM items WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| ClientError::Storage(format!("Failed to get item: {}", e)))
    }

    /// Remove an item.
    pub fn remove_item(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM items WHERE key = ?1", params![key])
            .map_err(|e| ClientError::Storage(format!("Failed to remove item: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_set_get_remove() {
        let storage = Storage::open_memory().unwrap();
        storage.set_cookie("token", "abc", 7).unwrap();
        assert_eq!(storage.get_cookie("token").unwrap().as_deref(), Some("abc"));

        storage.set_cookie("token", "def", 7).unwrap();
        assert_eq!(storage.get_cookie("token").unwrap().as_deref(), Some("def"));

        storage.remove_cookie("token").unwrap();
        assert!(storage.get_cookie("token").unwrap().is_none());
    }

    #[test]
    fn expired_cookie_is_missing_and_removed() {
        let storage = Storage::open_memory().unwrap();
        storage
            .set_cookie_until("token", "old", now_timestamp() - 60)
            .unwrap();
        storage.set_cookie("other", "fresh", 1).unwrap();

        assert!(storage.get_cookie("token").unwrap().is_none());
        assert_eq!(storage.purge_expired_cookies().unwrap(), 0);
        assert_eq!(storage.get_cookie("other").unwrap().as_deref(), Some("fresh"));
    }

    #[test]
    fn purge_expired_cookies() {
        let storage = Storage::open_memory().unwrap();
        storage.set_cookie_until("a", "1", now_timestamp() - 1).unwrap();
        storage.set_cookie_until("b", "2", now_timestamp() - 1).unwrap();
        storage.set_cookie("c", "3", 7).unwrap();

        assert_eq!(storage.purge_expired_cookies().unwrap(), 2);
        assert!(storage.get_cookie("c").unwrap().is_some());
    }

    #[test]
    fn items_round_trip() {
        let storage = Storage::open_memory().unwrap();
        assert!(storage.get_item("user").unwrap().is_none());

        storage.set_item("user", "{}").unwrap();
        assert_eq!(storage.get_item("user").unwrap().as_deref(), Some("{}"));

        storage.remove_item("user").unwrap();
        assert!(storage.get_item("user").unwrap().is_none());
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.db");

        {
            let storage = Storage::open(&path).unwrap();
            storage.set_cookie("token", "persisted", 7).unwrap();
            storage.set_item("user", r#"{"id":1}"#).unwrap();
        }

        let storage = Storage::open(&path).unwrap();
        assert_eq!(
            storage.get_cookie("token").unwrap().as_deref(),
            Some("persisted")
        );
        assert_eq!(storage.get_item("user").unwrap().as_deref(), Some(r#"{"id":1}"#));
    }
}
