//! SQLite-backed append-only event store

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::StoreError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS events (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at  TEXT NOT NULL,
    source      TEXT NOT NULL,
    type        TEXT NOT NULL,
    data        TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_events_source ON events(source);
";

const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA busy_timeout = 5000;
";

/// One persisted event row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub source: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: serde_json::Value,
}

/// Capability to append one event
///
/// This is what the orchestrator is handed; it never needs to read events back.
pub trait EventRecorder: Send + Sync {
    fn record_json(&self, source: &str, event_type: &str, data: serde_json::Value) -> Result<i64, StoreError>;
}

/// Append-only event log in a single SQLite database
pub struct EventStore {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for EventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStore").field("path", &self.path).finish()
    }
}

impl EventStore {
    /// Open (or create) the store at `path`, creating the schema if missing
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        debug!(?path, "EventStore::open: called");

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path).map_err(|source| StoreError::Open {
            path: path.clone(),
            source,
        })?;
        conn.execute_batch(PRAGMAS).map_err(|source| StoreError::Open {
            path: path.clone(),
            source,
        })?;

        Self::initialize(conn, Some(path))
    }

    /// Open a throwaway in-memory store
    pub fn open_in_memory() -> Result<Self, StoreError> {
        debug!("EventStore::open_in_memory: called");
        let conn = Connection::open_in_memory()?;
        Self::initialize(conn, None)
    }

    fn initialize(conn: Connection, path: Option<PathBuf>) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Path of the database file (None for in-memory stores)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Append one event and return its id
    pub fn record<T: Serialize + ?Sized>(&self, source: &str, event_type: &str, data: &T) -> Result<i64, StoreError> {
        debug!(%source, %event_type, "EventStore::record: called");
        let json = serde_json::to_string(data)?;
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO events (created_at, source, type, data) VALUES (?1, ?2, ?3, ?4)",
            params![created_at, source, event_type, json],
        )?;
        let id = conn.last_insert_rowid();
        debug!(%id, "EventStore::record: inserted");
        Ok(id)
    }

    /// Most recent events first, optionally restricted to one source
    pub fn recent(&self, limit: usize, source: Option<&str>) -> Result<Vec<Event>, StoreError> {
        debug!(%limit, ?source, "EventStore::recent: called");
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let conn = self.lock()?;

        let rows = match source {
            Some(source) => {
                let mut stmt = conn.prepare(
                    "SELECT id, created_at, source, type, data FROM events
                     WHERE source = ?1 ORDER BY id DESC LIMIT ?2",
                )?;
                let rows = stmt
                    .query_map(params![source, limit], raw_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt =
                    conn.prepare("SELECT id, created_at, source, type, data FROM events ORDER BY id DESC LIMIT ?1")?;
                let rows = stmt.query_map(params![limit], raw_row)?.collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };

        rows.into_iter().map(RawRow::into_event).collect()
    }

    /// Fetch a single event by id
    pub fn get(&self, id: i64) -> Result<Option<Event>, StoreError> {
        debug!(%id, "EventStore::get: called");
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, created_at, source, type, data FROM events WHERE id = ?1",
                params![id],
                raw_row,
            )
            .optional()?;
        row.map(RawRow::into_event).transpose()
    }

    /// Total number of events
    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

impl EventRecorder for EventStore {
    fn record_json(&self, source: &str, event_type: &str, data: serde_json::Value) -> Result<i64, StoreError> {
        self.record(source, event_type, &data)
    }
}

struct RawRow {
    id: i64,
    created_at: String,
    source: String,
    event_type: String,
    data: String,
}

fn raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        id: row.get(0)?,
        created_at: row.get(1)?,
        source: row.get(2)?,
        event_type: row.get(3)?,
        data: row.get(4)?,
    })
}

impl RawRow {
    fn into_event(self) -> Result<Event, StoreError> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| StoreError::Corrupt {
                id: self.id,
                reason: format!("bad timestamp '{}': {}", self.created_at, e),
            })?
            .with_timezone(&Utc);
        let data = serde_json::from_str(&self.data).map_err(|e| StoreError::Corrupt {
            id: self.id,
            reason: format!("bad JSON payload: {}", e),
        })?;

        Ok(Event {
            id: self.id,
            created_at,
            source: self.source,
            event_type: self.event_type,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_record_returns_increasing_ids() {
        let store = EventStore::open_in_memory().unwrap();

        let a = store.record("codex", "plan", &json!({"n": 1})).unwrap();
        let b = store.record("claude", "plan", &json!({"n": 2})).unwrap();
        let c = store.record("orchestrator", "merge", &json!({"n": 3})).unwrap();

        assert!(a < b && b < c);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_recent_is_newest_first() {
        let store = EventStore::open_in_memory().unwrap();
        for n in 0..5 {
            store.record("codex", "plan", &json!({ "n": n })).unwrap();
        }

        let events = store.recent(3, None).unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].data["n"], 4);
        assert_eq!(events[2].data["n"], 2);
    }

    #[test]
    fn test_recent_filters_by_source() {
        let store = EventStore::open_in_memory().unwrap();
        store.record("codex", "plan", &json!({})).unwrap();
        store.record("claude", "plan", &json!({})).unwrap();
        store.record("claude", "plan", &json!({})).unwrap();

        let events = store.recent(10, Some("claude")).unwrap();

        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.source == "claude"));
    }

    #[test]
    fn test_get_roundtrips_payload() {
        let store = EventStore::open_in_memory().unwrap();
        let id = store
            .record("orchestrator", "merge", &json!({"mergedPrompt": "Task: x"}))
            .unwrap();

        let event = store.get(id).unwrap().expect("event should exist");
        assert_eq!(event.source, "orchestrator");
        assert_eq!(event.event_type, "merge");
        assert_eq!(event.data["mergedPrompt"], "Task: x");

        assert!(store.get(id + 100).unwrap().is_none());
    }

    #[test]
    fn test_reopen_keeps_rows() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("events.db");

        {
            let store = EventStore::open(&path).unwrap();
            store.record("codex", "plan", &json!({"first": true})).unwrap();
        }

        let store = EventStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        store.record("codex", "plan", &json!({"first": false})).unwrap();
        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.path(), Some(path.as_path()));
    }

    #[test]
    fn test_recorder_trait_object() {
        let store = EventStore::open_in_memory().unwrap();
        let recorder: &dyn EventRecorder = &store;

        let id = recorder.record_json("claude", "plan", json!("raw text")).unwrap();

        let event = store.get(id).unwrap().unwrap();
        assert_eq!(event.data, json!("raw text"));
    }
}
