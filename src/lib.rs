//! Level-of-detail time-series aggregation over an embedded relational
//! store: ingest a stream of timestamped readings, maintain a five-tier
//! pyramid of precomputed weighted summaries (Seconds/Minutes/Hours/Days/
//! Weeks), and answer `(start, end, n)` range queries by reading whichever
//! tier covers each sub-interval most coarsely.
//!
//! The engine is single-threaded cooperative: every mutating call takes
//! `&mut `[`DataModel`], and callers are responsible for serializing access
//! (see [`model`] for the rationale). It does not read configuration files,
//! parse CLI arguments, or install a `tracing` subscriber — those are left
//! to the embedding application; [`logging::init_default_tracing`] is
//! provided only as a convenience for tests and examples.

pub mod config;
pub mod error;
#[cfg(test)]
mod fixtures;
pub mod logging;
pub mod model;
pub mod processor;
pub mod reading;
pub mod schema;
pub mod store;
pub mod table;
pub mod timestamp;
pub mod tier;

pub use config::{KeepRawReadings, StoreConfig};
pub use error::{EngineError, EngineResult};
pub use model::DataModel;
pub use reading::{Reading, ReadingSummary, SummaryFunction, WeightedObject};
pub use schema::{Cell, Column, LeafKind, LeafSpec, ReadingLeaf, ReadingPayload, SqlType};
pub use timestamp::TimeStamp;
pub use tier::Tier;
