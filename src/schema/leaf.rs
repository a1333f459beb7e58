//! Primitive leaf kinds and the [`ReadingLeaf`] conversions between typed
//! values and SQL cells: one kind tag per primitive, one SQL storage class
//! per kind, and a bind/materialize pair per kind.

use crate::error::{EngineError, EngineResult};

/// The primitive kind of a payload leaf. `Array` exists only so that a
/// hand-written [`super::ReadingPayload`] impl can describe an unsupported
/// shape and exercise schema-compile rejection; the [`crate::derive_reading`]
/// macro never produces it, since there is no `ReadingLeaf` impl for
/// `Vec<T>` to select it through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Enum,
    Text,
    Array(&'static LeafKind),
}

/// A single SQL cell value, storage-class-tagged the way SQLite itself is.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl rusqlite::types::ToSql for Cell {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        match self {
            Cell::Integer(v) => v.to_sql(),
            Cell::Real(v) => v.to_sql(),
            Cell::Text(v) => v.to_sql(),
        }
    }
}

/// Implemented for every Rust type that can occupy a leaf position in a
/// [`super::ReadingPayload`]. There is deliberately no impl for `Vec<T>` or
/// any pointer-like type — that absence is what makes arrays unrepresentable
/// through [`crate::derive_reading`] at compile time.
pub trait ReadingLeaf: Clone + std::fmt::Debug {
    fn leaf_kind() -> LeafKind;
    fn into_cell(&self) -> Cell;
    fn from_cell(cell: &Cell) -> EngineResult<Self>
    where
        Self: Sized;
}

macro_rules! integer_leaf {
    ($t:ty, $kind:expr) => {
        impl ReadingLeaf for $t {
            fn leaf_kind() -> LeafKind {
                $kind
            }

            fn into_cell(&self) -> Cell {
                Cell::Integer(*self as i64)
            }

            fn from_cell(cell: &Cell) -> EngineResult<Self> {
                match cell {
                    Cell::Integer(v) => Ok(*v as $t),
                    other => Err(EngineError::bind_failure(format!(
                        "expected INTEGER cell for {}, got {other:?}",
                        stringify!($t)
                    ))),
                }
            }
        }
    };
}

integer_leaf!(bool, LeafKind::Bool);
integer_leaf!(i8, LeafKind::I8);
integer_leaf!(i16, LeafKind::I16);
integer_leaf!(i32, LeafKind::I32);
integer_leaf!(i64, LeafKind::I64);
integer_leaf!(u8, LeafKind::U8);
integer_leaf!(u16, LeafKind::U16);
integer_leaf!(u32, LeafKind::U32);
integer_leaf!(u64, LeafKind::U64);

macro_rules! real_leaf {
    ($t:ty, $kind:expr) => {
        impl ReadingLeaf for $t {
            fn leaf_kind() -> LeafKind {
                $kind
            }

            fn into_cell(&self) -> Cell {
                Cell::Real(*self as f64)
            }

            fn from_cell(cell: &Cell) -> EngineResult<Self> {
                match cell {
                    Cell::Real(v) => Ok(*v as $t),
                    // SQLite will happily hand back an INTEGER-affinity
                    // column as an integer cell if every value so far was
                    // whole; accept it rather than erroring.
                    Cell::Integer(v) => Ok(*v as $t),
                    other => Err(EngineError::bind_failure(format!(
                        "expected REAL cell for {}, got {other:?}",
                        stringify!($t)
                    ))),
                }
            }
        }
    };
}

real_leaf!(f32, LeafKind::F32);
real_leaf!(f64, LeafKind::F64);

impl ReadingLeaf for String {
    fn leaf_kind() -> LeafKind {
        LeafKind::Text
    }

    fn into_cell(&self) -> Cell {
        Cell::Text(self.clone())
    }

    fn from_cell(cell: &Cell) -> EngineResult<Self> {
        match cell {
            Cell::Text(v) => Ok(v.clone()),
            other => Err(EngineError::bind_failure(format!(
                "expected TEXT cell for String, got {other:?}"
            ))),
        }
    }
}

/// Implements [`ReadingLeaf`] for an enum type via its `Display`/`FromStr`,
/// binding it as its string name and parsing that name back into the enum
/// value on materialize.
///
/// ```ignore
/// #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
/// enum EStressState { #[default] Unknown, Under, Normal, Over }
///
/// impl std::fmt::Display for EStressState { /* ... */ }
/// impl std::str::FromStr for EStressState { /* ... */ }
///
/// lodstore::impl_enum_leaf!(EStressState);
/// ```
#[macro_export]
macro_rules! impl_enum_leaf {
    ($t:ty) => {
        impl $crate::schema::ReadingLeaf for $t {
            fn leaf_kind() -> $crate::schema::LeafKind {
                $crate::schema::LeafKind::Enum
            }

            fn into_cell(&self) -> $crate::schema::Cell {
                $crate::schema::Cell::Text(self.to_string())
            }

            fn from_cell(cell: &$crate::schema::Cell) -> $crate::error::EngineResult<Self> {
                match cell {
                    $crate::schema::Cell::Text(v) => v.parse::<$t>().map_err(|_| {
                        $crate::error::EngineError::bind_failure(format!(
                            "'{}' is not a valid {}",
                            v,
                            stringify!($t)
                        ))
                    }),
                    other => Err($crate::error::EngineError::bind_failure(format!(
                        "expected TEXT cell for enum {}, got {:?}",
                        stringify!($t),
                        other
                    ))),
                }
            }
        }
    };
}
