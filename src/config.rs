//! Engine configuration.
//!
//! The core never reads a config file or an environment variable itself —
//! that's left to the embedding application. It only needs a plain,
//! `Default`-able struct handed to it at construction time rather than
//! something the storage layer loads on its own.

use std::path::PathBuf;

/// Whether raw (un-aggregated) readings are persisted alongside the LOD
/// pyramid.
///
/// Disabling this still lets the Seconds tier close correctly: the
/// processor always has the in-memory [`crate::tier::RawReadingCache`] to
/// fall back on, so the raw table is never required for correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepRawReadings {
    Enabled,
    Disabled,
}

impl Default for KeepRawReadings {
    fn default() -> Self {
        Self::Disabled
    }
}

/// Configuration for a [`crate::DataModel`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
    /// Whether raw readings are additionally persisted per registered type.
    pub keep_raw_readings: KeepRawReadings,
    /// `busy_timeout` pragma, milliseconds. Only relevant if the database
    /// file is ever shared, which the exclusive locking mode otherwise
    /// rules out; kept as a knob for embedding apps that relax locking.
    pub busy_timeout_ms: u32,
}

impl StoreConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Self::default()
        }
    }

    pub fn with_raw_readings(mut self, keep: KeepRawReadings) -> Self {
        self.keep_raw_readings = keep;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/lod-store.db"),
            keep_raw_readings: KeepRawReadings::default(),
            busy_timeout_ms: 5_000,
        }
    }
}
