//! Error taxonomy for the engine.
//!
//! One enum, matching the mutually exclusive failure kinds the engine can
//! produce. Every fallible operation on the public API returns
//! [`EngineResult<T>`].

use std::fmt;

/// Errors produced by the engine.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// Open/create/prepare/step/reset failure from the relational store,
    /// including index creation.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// A payload shape the schema projector cannot represent: an array or
    /// pointer-like leaf, an empty path resolving to a composite, or a
    /// duplicate type registration.
    #[error("unsupported schema: {0}")]
    UnsupportedSchema(String),

    /// A reading was handed to `add` whose dynamic type has no registered
    /// processor, or whose type does not match the table's declared type.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A typed value could not be converted to a SQL cell or vice versa
    /// (e.g. an enum name outside its valid range).
    #[error("bind failure: {0}")]
    BindFailure(String),

    /// A property path did not resolve against the type it was checked
    /// against.
    #[error("unknown property: {0}")]
    UnknownProperty(String),

    /// An internal invariant was violated (backwards chunk index when not
    /// stale, empty input handed to a coarser tier close, ...). These are
    /// bugs, not expected runtime conditions.
    #[error("internal invariant violated: {0}")]
    Logic(String),
}

/// Result alias used throughout the engine's public API.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub(crate) fn logic(msg: impl fmt::Display) -> Self {
        Self::Logic(msg.to_string())
    }

    pub(crate) fn unsupported(msg: impl fmt::Display) -> Self {
        Self::UnsupportedSchema(msg.to_string())
    }

    pub(crate) fn unknown_property(msg: impl fmt::Display) -> Self {
        Self::UnknownProperty(msg.to_string())
    }

    pub(crate) fn bind_failure(msg: impl fmt::Display) -> Self {
        Self::BindFailure(msg.to_string())
    }

    pub(crate) fn type_mismatch(msg: impl fmt::Display) -> Self {
        Self::TypeMismatch(msg.to_string())
    }
}
