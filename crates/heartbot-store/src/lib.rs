//! `heartbot-store` – per-user history persistence.
//!
//! [`SqliteHistoryStore`] implements [`HistoryStore`] on a local SQLite
//! database. Each user owns two documents, the chat transcript and the BPM
//! history, stored as JSON and replaced wholesale on every save.
//!
//! # Storage layout
//!
//! | table          | columns                                        |
//! |----------------|------------------------------------------------|
//! | `chat_history` | `username` (PK), `updated_at`, `document`      |
//! | `bpm_readings` | `username` (PK), `updated_at`, `document`      |
//!
//! `updated_at` is an RFC-3339 UTC timestamp.
//!
//! # Example
//!
//! ```rust
//! use heartbot_store::SqliteHistoryStore;
//! use heartbot_types::HistoryStore;
//!
//! let store = SqliteHistoryStore::open_in_memory().unwrap();
//! store.save_readings("alice", &[72.5, 74.0]).unwrap();
//! assert_eq!(store.load_readings("alice").unwrap(), vec![72.5, 74.0]);
//! ```

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use heartbot_types::{ConversationTurn, HeartbotError, HistoryStore};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Document encoding error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Store connection lock poisoned")]
    Poisoned,
}

impl From<StoreError> for HeartbotError {
    fn from(e: StoreError) -> Self {
        HeartbotError::Persistence(e.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Documents
// ─────────────────────────────────────────────────────────────────────────────

/// The two per-user documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Document {
    Transcript,
    Readings,
}

impl Document {
    fn table(self) -> &'static str {
        match self {
            Document::Transcript => "chat_history",
            Document::Readings => "bpm_readings",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SqliteHistoryStore
// ─────────────────────────────────────────────────────────────────────────────

pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    /// Open (or create) a persistent SQLite database at `path`.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    /// Open a temporary in-memory database (useful for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS chat_history (
                username   TEXT NOT NULL PRIMARY KEY,
                updated_at TEXT NOT NULL,
                document   TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS bpm_readings (
                username   TEXT NOT NULL PRIMARY KEY,
                updated_at TEXT NOT NULL,
                document   TEXT NOT NULL
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Replace `username`'s `doc` with `value`.
    pub fn save<T: Serialize + ?Sized>(
        &self,
        doc: Document,
        username: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string(value)?;
        let sql = format!(
            "INSERT OR REPLACE INTO {} (username, updated_at, document) VALUES (?1, ?2, ?3)",
            doc.table()
        );
        self.lock()?
            .execute(&sql, params![username, Utc::now().to_rfc3339(), json])?;
        debug!(user = username, table = doc.table(), "document saved");
        Ok(())
    }

    /// Load `username`'s `doc`.
    ///
    /// A missing row or a payload that no longer decodes yields an empty
    /// document; only SQLite failures are errors.
    pub fn load<T: DeserializeOwned + Default>(
        &self,
        doc: Document,
        username: &str,
    ) -> Result<T, StoreError> {
        let sql = format!("SELECT document FROM {} WHERE username = ?1", doc.table());
        let raw: Option<String> = self
            .lock()?
            .query_row(&sql, params![username], |row| row.get(0))
            .optional()?;
        let Some(raw) = raw else {
            return Ok(T::default());
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(user = username, table = doc.table(), error = %e, "undecodable document treated as empty");
                Ok(T::default())
            }
        }
    }

    /// When `username`'s `doc` was last saved.
    pub fn updated_at(&self, doc: Document, username: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        let sql = format!("SELECT updated_at FROM {} WHERE username = ?1", doc.table());
        let raw: Option<String> = self
            .lock()?
            .query_row(&sql, params![username], |row| row.get(0))
            .optional()?;
        Ok(raw.and_then(|ts| ts.parse::<DateTime<Utc>>().ok()))
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn load_transcript(&self, username: &str) -> Result<Vec<ConversationTurn>, HeartbotError> {
        Ok(self.load(Document::Transcript, username)?)
    }

    /// Empty transcripts are not written, so a cleared session never wipes
    /// the stored document.
    fn save_transcript(
        &self,
        username: &str,
        transcript: &[ConversationTurn],
    ) -> Result<(), HeartbotError> {
        if transcript.is_empty() {
            return Ok(());
        }
        Ok(self.save(Document::Transcript, username, transcript)?)
    }

    fn load_readings(&self, username: &str) -> Result<Vec<f64>, HeartbotError> {
        Ok(self.load(Document::Readings, username)?)
    }

    fn save_readings(&self, username: &str, readings: &[f64]) -> Result<(), HeartbotError> {
        if readings.is_empty() {
            return Ok(());
        }
        Ok(self.save(Document::Readings, username, readings)?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
