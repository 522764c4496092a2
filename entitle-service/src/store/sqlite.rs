//! Persistent license store backed by SQLite.
//!
//! Every accepted license is kept in `licenses`; the single row in
//! `active_license` points at the one currently in force. Replace and clear
//! each run inside one transaction, so a reader sees either the old or the
//! new pointer, never a mix.

use crate::error::{StoreError, StoreResult};
use crate::ports::{LicenseState, LicenseStore};
use async_trait::async_trait;
use entitle_license::License;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Persistent store for the active license backed by SQLite.
pub struct SqliteLicenseStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLicenseStore {
    /// Opens (or creates) a license store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| StoreError::Unavailable(format!("failed to open license store: {e}")))?;
        Self::from_connection(conn)
    }

    /// Opens an in-memory license store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            StoreError::Unavailable(format!("failed to open in-memory license store: {e}"))
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("license store lock poisoned".to_string()))
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS licenses (
                id TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                saved_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS active_license (
                slot INTEGER PRIMARY KEY CHECK (slot = 1),
                license_id TEXT NOT NULL REFERENCES licenses(id)
            );
            ",
        )
        .map_err(|e| StoreError::Unavailable(format!("failed to init license schema: {e}")))?;
        Ok(())
    }

    /// Returns the ids of every license ever stored, most recent first.
    pub fn stored_license_ids(&self) -> StoreResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id FROM licenses ORDER BY saved_at DESC, rowid DESC")
            .map_err(|e| StoreError::Unavailable(format!("failed to prepare license query: {e}")))?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::Unavailable(format!("failed to query licenses: {e}")))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Unavailable(format!("failed to read license row: {e}")))?;
        Ok(ids)
    }
}

#[async_trait]
impl LicenseStore for SqliteLicenseStore {
    async fn replace(&self, license: Arc<License>) -> StoreResult<()> {
        let body = serde_json::to_string(license.as_ref())
            .map_err(|e| StoreError::Corrupt(format!("failed to encode license: {e}")))?;
        let saved_at = chrono::Utc::now().to_rfc3339();

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| StoreError::Unavailable(format!("failed to begin transaction: {e}")))?;
        tx.execute(
            "INSERT OR REPLACE INTO licenses (id, body, saved_at) VALUES (?1, ?2, ?3)",
            params![license.id(), body, saved_at],
        )
        .map_err(|e| StoreError::Unavailable(format!("failed to save license: {e}")))?;
        tx.execute(
            "INSERT OR REPLACE INTO active_license (slot, license_id) VALUES (1, ?1)",
            params![license.id()],
        )
        .map_err(|e| StoreError::Unavailable(format!("failed to activate license: {e}")))?;
        tx.commit()
            .map_err(|e| StoreError::Unavailable(format!("failed to commit license: {e}")))?;

        debug!(license_id = license.id(), "license activated in sqlite store");
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM active_license", [])
            .map_err(|e| StoreError::Unavailable(format!("failed to clear license: {e}")))?;
        Ok(())
    }

    async fn current(&self) -> StoreResult<LicenseState> {
        let conn = self.lock()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT l.body FROM active_license a JOIN licenses l ON l.id = a.license_id WHERE a.slot = 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError::Unavailable(format!("failed to load license: {e}")))?;

        match body {
            None => Ok(LicenseState::Absent),
            Some(body) => {
                let license: License = serde_json::from_str(&body)
                    .map_err(|e| StoreError::Corrupt(format!("failed to decode license: {e}")))?;
                Ok(LicenseState::Active(Arc::new(license)))
            }
        }
    }
}
