//! EventStore - append-only SQLite event log
//!
//! Every call to [`EventStore::record`] becomes exactly one row. Rows are never
//! updated or deleted; the store only appends and reads.
//!
//! # Schema
//!
//! ```text
//! events
//! ├── id          INTEGER PRIMARY KEY AUTOINCREMENT
//! ├── created_at  TEXT  (RFC 3339, UTC)
//! ├── source      TEXT  ("codex", "claude", "orchestrator", ...)
//! ├── type        TEXT  ("plan", "merge", ...)
//! └── data        TEXT  (JSON payload)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use eventstore::EventStore;
//!
//! let store = EventStore::open("events.db")?;
//! let id = store.record("codex", "plan", &serde_json::json!({"task": "Add logging"}))?;
//! let events = store.recent(10, None)?;
//! ```

mod error;
mod store;

pub use error::StoreError;
pub use store::{Event, EventRecorder, EventStore};

/// Default number of events returned by listing commands
pub const DEFAULT_LIST_LIMIT: usize = 20;
