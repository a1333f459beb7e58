//! The five fixed levels of detail and the per-tier chunk bookkeeping that
//! drives when a chunk closes: each tier tracks only the index of its
//! currently open chunk; a new reading either belongs to that chunk, is
//! stale (belongs to an earlier, already-closed chunk), or closes the open
//! chunk and opens a new one.

use crate::reading::ReadingSummary;

/// One level of detail in the aggregation pyramid. Fixed at five levels, not
/// user-configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
}

/// Static description of a [`Tier`]: its chunk width, in seconds, and the
/// name its backing table carries.
#[derive(Debug, Clone, Copy)]
pub struct TierSpec {
    pub tier: Tier,
    pub seconds_per_chunk: i64,
    pub table_suffix: &'static str,
}

/// The fixed pyramid, coarsest last, in the order the query planner walks
/// when widening its search.
pub const TIERS: [TierSpec; 5] = [
    TierSpec { tier: Tier::Seconds, seconds_per_chunk: 1, table_suffix: "seconds" },
    TierSpec { tier: Tier::Minutes, seconds_per_chunk: 60, table_suffix: "minutes" },
    TierSpec { tier: Tier::Hours, seconds_per_chunk: 3_600, table_suffix: "hours" },
    TierSpec { tier: Tier::Days, seconds_per_chunk: 86_400, table_suffix: "days" },
    TierSpec { tier: Tier::Weeks, seconds_per_chunk: 604_800, table_suffix: "weeks" },
];

/// Sentinel meaning "no chunk open yet" for [`TierState::current_chunk_index`].
const NO_CHUNK: i64 = -1;

/// What a new reading's chunk index means for a tier's currently open chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkTransition {
    /// The reading belongs to the chunk that is already open; fold it in.
    Open,
    /// The reading's chunk index is behind the open chunk's: it arrived out
    /// of order after that chunk was already superseded. Dropped, not
    /// folded in and not closing anything.
    Stale,
    /// The reading belongs to a later chunk than the one currently open.
    /// `previous` is `Some(chunk_index)` of the chunk to close and emit a
    /// summary for, or `None` if no chunk was open yet (first reading ever
    /// seen at this tier).
    Closed { previous: Option<i64> },
}

/// Per-tier bookkeeping: which chunk index is currently accumulating.
#[derive(Debug, Clone, Copy)]
pub struct TierState {
    current_chunk_index: i64,
}

impl TierState {
    pub fn new() -> Self {
        Self { current_chunk_index: NO_CHUNK }
    }

    /// Chunk index a tier with the given chunk width assigns to a reading at
    /// `seconds` (Unix seconds).
    pub fn chunk_index(seconds_per_chunk: i64, seconds: i64) -> i64 {
        seconds.div_euclid(seconds_per_chunk)
    }

    pub fn current_chunk_index(&self) -> Option<i64> {
        if self.current_chunk_index == NO_CHUNK {
            None
        } else {
            Some(self.current_chunk_index)
        }
    }

    /// Classify `chunk_index` against the chunk currently open, without
    /// mutating state — callers act on the transition and then call
    /// [`Self::advance`] once they've handled any close.
    pub fn classify(&self, chunk_index: i64) -> ChunkTransition {
        match self.current_chunk_index() {
            None => ChunkTransition::Closed { previous: None },
            Some(current) if chunk_index == current => ChunkTransition::Open,
            Some(current) if chunk_index < current => ChunkTransition::Stale,
            Some(current) => ChunkTransition::Closed { previous: Some(current) },
        }
    }

    /// Record `chunk_index` as the newly open chunk, after any close implied
    /// by [`Self::classify`] has been handled.
    pub fn advance(&mut self, chunk_index: i64) {
        self.current_chunk_index = chunk_index;
    }
}

impl Default for TierState {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory cache of one-second summaries backing the Seconds tier, used
/// whether or not the raw table is persisted.
pub type RawReadingCache<T> = Vec<ReadingSummary<T>>;
