//! Reflective schema mapping: projecting a payload type onto a flat set of
//! relational columns, and binding/materializing values in both directions.
//!
//! Rust has no runtime type introspection for arbitrary structs, so that role
//! is filled by the [`ReadingPayload`] trait, normally implemented via
//! [`crate::derive_reading`]. The trait only needs to describe a *flat*
//! ordered list of leaves plus how to bind/materialize them — the actual
//! column-name generation and uniqueness enforcement lives here, compiled
//! once per registered type.

mod leaf;
mod macros;

pub use leaf::{Cell, LeafKind, ReadingLeaf};

use crate::error::{EngineError, EngineResult};

/// SQL storage class a leaf kind is projected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Real,
    Text,
}

impl SqlType {
    pub fn as_sql(self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text => "TEXT",
        }
    }
}

/// One leaf of a payload's structural description, as declared by
/// [`ReadingPayload::leaves`]. `path` is the sequence of property names from
/// the payload root to this leaf (depth-first declaration order).
#[derive(Debug, Clone)]
pub struct LeafSpec {
    pub path: Vec<&'static str>,
    pub kind: LeafKind,
}

/// A compiled column: a leaf's logical path, its database-safe, unique
/// column name, and its SQL storage class.
#[derive(Debug, Clone)]
pub struct Column {
    pub path: String,
    pub column_name: String,
    pub sql_type: SqlType,
}

/// Implemented (usually via [`crate::derive_reading`]) by every payload type
/// that can be stored in the engine: an ordered list of (path, primitive
/// kind), a bind projector, and a materializer — without requiring a
/// reflection runtime.
pub trait ReadingPayload: Clone + std::fmt::Debug + Send + Sync + 'static {
    /// Depth-first, declaration-order list of leaves. Must be stable across
    /// calls (and is in practice, since it has no runtime state).
    fn leaves() -> Vec<LeafSpec>;

    /// Push one [`Cell`] per leaf, in the same order `leaves()` declares
    /// them.
    fn bind_leaves(&self, out: &mut Vec<Cell>);

    /// Reconstruct `Self` from exactly `leaves().len()` cells, in the same
    /// order.
    fn from_cells(cells: &[Cell]) -> EngineResult<Self>
    where
        Self: Sized;

    /// A payload with no real observation behind it, used for a degenerate
    /// zero-activity summary (a sub-range with no reading falling inside it).
    fn default_payload() -> Self;
}

fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Compile a payload type's leaves into a unique, sanitized column list,
/// skipping any leaf whose joined path appears in `ignored_paths`.
///
/// The depth-first walk already happened in [`ReadingPayload::leaves`]; here
/// we map kinds to SQL types, sanitize names, and disambiguate collisions
/// with a `_N` suffix.
pub fn compile_columns(
    leaves: &[LeafSpec],
    ignored_paths: &[&str],
) -> EngineResult<Vec<Column>> {
    if leaves.is_empty() {
        return Err(EngineError::unsupported(
            "payload type has no leaf properties to store",
        ));
    }

    let mut columns: Vec<Column> = Vec::with_capacity(leaves.len());
    for leaf in leaves {
        let path = leaf.path.join("/");
        if ignored_paths.contains(&path.as_str()) {
            continue;
        }

        if let LeafKind::Array(_) = leaf.kind {
            return Err(EngineError::unsupported(format!(
                "property '{path}' is an array; arrays are not supported in the store"
            )));
        }

        let sql_type = match leaf.kind {
            LeafKind::Bool
            | LeafKind::I8
            | LeafKind::I16
            | LeafKind::I32
            | LeafKind::I64
            | LeafKind::U8
            | LeafKind::U16
            | LeafKind::U32
            | LeafKind::U64 => SqlType::Integer,
            LeafKind::F32 | LeafKind::F64 => SqlType::Real,
            LeafKind::Enum | LeafKind::Text => SqlType::Text,
            LeafKind::Array(_) => unreachable!("handled above"),
        };

        let base_name = sanitize(&path);
        let mut column_name = base_name.clone();
        let mut suffix = 1;
        while columns.iter().any(|c| c.column_name == column_name) {
            column_name = format!("{base_name}_{suffix}");
            suffix += 1;
        }

        columns.push(Column { path, column_name, sql_type });
    }

    if columns.is_empty() {
        return Err(EngineError::unsupported(
            "payload type has no leaf properties left to store after applying ignored_paths",
        ));
    }

    Ok(columns)
}

/// Find the compiled column for a given logical path, used when creating an
/// index on a known property.
pub fn column_for_path<'a>(columns: &'a [Column], path: &str) -> EngineResult<&'a Column> {
    columns
        .iter()
        .find(|c| c.path == path)
        .ok_or_else(|| EngineError::unknown_property(format!("no column for path '{path}'")))
}
