//! Millisecond-precision timestamp used throughout the engine.

use std::fmt;

/// Milliseconds since the Unix epoch. `-1` denotes "unset" (see
/// [`TimeStamp::UNSET`]).
///
/// Internal tier arithmetic works in seconds (`millis / 1000`); everything
/// on the wire and in the store stays in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeStamp(pub i64);

impl TimeStamp {
    /// Sentinel for "no timestamp recorded yet".
    pub const UNSET: TimeStamp = TimeStamp(-1);

    #[inline]
    pub fn millis(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn is_set(self) -> bool {
        self != Self::UNSET
    }

    /// Floor-divide to whole seconds.
    #[inline]
    pub fn seconds(self) -> i64 {
        self.0.div_euclid(1000)
    }

    #[inline]
    pub fn from_seconds(seconds: i64) -> Self {
        Self(seconds * 1000)
    }

    #[inline]
    pub fn plus_millis(self, millis: i64) -> Self {
        Self(self.0 + millis)
    }
}

impl fmt::Display for TimeStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TimeStamp {
    fn from(millis: i64) -> Self {
        Self(millis)
    }
}
