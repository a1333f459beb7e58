//! The relational store: a single `rusqlite` connection, opened once per
//! [`crate::DataModel`] and shared by every registered type's table handles.
//!
//! A single-writer, single-process embedded store has no need for SQLite's
//! default durability/concurrency trade-offs, so every pragma below trades
//! crash-safety for throughput: WAL journaling, no fsync on commit, and an
//! exclusive lock for the lifetime of the connection.

use std::path::Path;

use rusqlite::Connection;

use crate::error::EngineResult;

/// Owns the engine's `rusqlite::Connection`. Never shared behind an `Arc` —
/// [`crate::DataModel`] owns one `Store` for its whole lifetime and every
/// `TableHandle` borrows it through `&Connection`/`&mut Connection` calls
/// that don't outlive the borrow, so `prepare_cached` is used instead of
/// storing prepared statements (see [`crate::table`]).
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(db_path: impl AsRef<Path>, busy_timeout_ms: u32) -> EngineResult<Self> {
        let conn = Connection::open(db_path)?;
        Self::configure(&conn, busy_timeout_ms)?;
        Ok(Self { conn })
    }

    /// In-memory store, for tests and short-lived embeddings.
    pub fn open_in_memory(busy_timeout_ms: u32) -> EngineResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn, busy_timeout_ms)?;
        Ok(Self { conn })
    }

    fn configure(conn: &Connection, busy_timeout_ms: u32) -> EngineResult<()> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        conn.pragma_update(None, "synchronous", "OFF")?;
        conn.pragma_update(None, "locking_mode", "EXCLUSIVE")?;
        conn.pragma_update(None, "busy_timeout", busy_timeout_ms)?;
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
