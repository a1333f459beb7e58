//! Generic reading/summary shapes shared by every registered payload type:
//! an incoming timestamped value, a stored or returned summary with its
//! active-seconds weight, and the weight carrier fed to a summary function.

use crate::timestamp::TimeStamp;

/// A single observation of `T` at a point in time.
#[derive(Debug, Clone)]
pub struct Reading<T> {
    pub timestamp: TimeStamp,
    pub value: T,
}

impl<T> Reading<T> {
    pub fn new(timestamp: TimeStamp, value: T) -> Self {
        Self { timestamp, value }
    }
}

/// A tier's closed-chunk summary: the payload a [`SummaryFunction`] produced,
/// stamped with the chunk's timestamp and how many seconds of the chunk were
/// actually covered by input readings.
#[derive(Debug, Clone)]
pub struct ReadingSummary<T> {
    pub timestamp: TimeStamp,
    pub num_seconds_active: u32,
    pub value: T,
}

impl<T> ReadingSummary<T> {
    pub fn new(timestamp: TimeStamp, num_seconds_active: u32, value: T) -> Self {
        Self { timestamp, num_seconds_active, value }
    }
}

/// A [`ReadingSummary`] plus the weight it should carry when combined with
/// siblings into a coarser tier's summary (its coverage relative to the
/// coarser chunk's span).
#[derive(Debug, Clone)]
pub struct WeightedObject<T> {
    pub summary: ReadingSummary<T>,
    pub weight: f32,
}

impl<T> WeightedObject<T> {
    pub fn new(summary: ReadingSummary<T>, weight: f32) -> Self {
        Self { summary, weight }
    }
}

/// Combines a run of weighted summaries into one payload. Returns the bare
/// payload, not a full [`ReadingSummary`]: the caller (the processor) stamps
/// `timestamp`/`num_seconds_active` onto the result afterward, so summary
/// functions stay pure and total over non-empty input.
pub type SummaryFunction<T> = fn(&[WeightedObject<T>]) -> T;
