//! Concrete payload types and summary functions shared by this crate's own
//! test suite: a numeric leaf, an enum leaf, a nested payload, and their
//! averaging/tallying combiners. Not part of the public API — an embedding
//! application brings its own payload types.

use crate::derive_reading;
use crate::impl_enum_leaf;
use crate::reading::WeightedObject;
use crate::schema::ReadingPayload;

/// A single `f32` measurement, averaged across inputs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StressIntensity {
    pub value: f32,
}

derive_reading! {
    struct StressIntensity {
        leaf value: f32,
    }
}

/// Weighted mean of `value`. Total input weight is ~1.0 by construction
/// (uniform `1/n` on ingest, `active/total_active` on query), so dividing
/// isn't needed — the weighted sum already is the mean.
pub fn average_intensity(inputs: &[WeightedObject<StressIntensity>]) -> StressIntensity {
    let value = inputs.iter().map(|w| w.weight * w.summary.value.value).sum();
    StressIntensity { value }
}

/// Coarse categorical read on stress level, exercising enum-leaf binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StressState {
    #[default]
    Unknown,
    Low,
    Medium,
    High,
}

impl std::fmt::Display for StressState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StressState::Unknown => "Unknown",
            StressState::Low => "Low",
            StressState::Medium => "Medium",
            StressState::High => "High",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for StressState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unknown" => Ok(StressState::Unknown),
            "Low" => Ok(StressState::Low),
            "Medium" => Ok(StressState::Medium),
            "High" => Ok(StressState::High),
            other => Err(format!("'{other}' is not a StressState")),
        }
    }
}

impl_enum_leaf!(StressState);

/// Picks the most common state among the inputs, weighted by `weight`; ties
/// favor the input seen first. Exercises a non-numeric summary function.
pub fn dominant_state(inputs: &[WeightedObject<StressState>]) -> StressState {
    let mut totals: Vec<(StressState, f32)> = Vec::new();
    for input in inputs {
        let state = input.summary.value;
        if let Some(entry) = totals.iter_mut().find(|(s, _)| *s == state) {
            entry.1 += input.weight;
        } else {
            totals.push((state, input.weight));
        }
    }
    totals
        .into_iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(state, _)| state)
        .unwrap_or_default()
}

/// A composite payload nesting [`StressIntensity`] under a property, used to
/// exercise `derive_reading!`'s `nested` field kind and its path-prefixing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StressReading {
    pub intensity: StressIntensity,
    pub alert: bool,
}

derive_reading! {
    struct StressReading {
        nested intensity: StressIntensity,
        leaf alert: bool,
    }
}

pub fn average_reading(inputs: &[WeightedObject<StressReading>]) -> StressReading {
    let value = inputs.iter().map(|w| w.weight * w.summary.value.intensity.value).sum();
    let alert = inputs.iter().any(|w| w.summary.value.alert);
    StressReading { intensity: StressIntensity { value }, alert }
}

/// A hand-written [`ReadingPayload`] impl (not `derive_reading!`) describing
/// a property of kind [`crate::schema::LeafKind::Array`], which the macro
/// can never produce (there's no [`crate::schema::ReadingLeaf`] impl for
/// `Vec<T>`). Exercises runtime rejection at schema-compile time the same
/// way registering a string-array type should be rejected.
#[derive(Debug, Clone, Default)]
pub struct BadArrayReading {
    pub tags: Vec<String>,
}

impl ReadingPayload for BadArrayReading {
    fn leaves() -> Vec<crate::schema::LeafSpec> {
        vec![crate::schema::LeafSpec {
            path: vec!["tags"],
            kind: crate::schema::LeafKind::Array(&crate::schema::LeafKind::Text),
        }]
    }

    fn bind_leaves(&self, _out: &mut Vec<crate::schema::Cell>) {
        unreachable!("never compiled into a table")
    }

    fn from_cells(_cells: &[crate::schema::Cell]) -> crate::error::EngineResult<Self> {
        unreachable!("never compiled into a table")
    }

    fn default_payload() -> Self {
        Self::default()
    }
}
