//! The `derive_reading!` declarative macro: generates a [`super::ReadingPayload`]
//! impl for an already-declared struct by walking its fields once, at macro
//! expansion time, rather than through any runtime type introspection.
//!
//! Two field kinds are recognized:
//!
//! - `leaf $name: $ty` — `$ty` must implement [`super::ReadingLeaf`]; becomes
//!   one column.
//! - `nested $name: $ty` — `$ty` must implement [`super::ReadingPayload`]
//!   itself; its own leaves are spliced in with `$name` pushed onto their
//!   path, recursing into compound properties the same way a flattened
//!   nested struct is meant to read back out.
///
/// ```ignore
/// derive_reading! {
///     struct StressIntensity {
///         leaf value: f32,
///         leaf confidence: f32,
///     }
/// }
///
/// derive_reading! {
///     struct StressReading {
///         nested intensity: StressIntensity,
///         leaf active: bool,
///     }
/// }
/// ```
#[macro_export]
macro_rules! derive_reading {
    (
        struct $name:ident {
            $( $kind:ident $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        impl $crate::schema::ReadingPayload for $name {
            fn leaves() -> ::std::vec::Vec<$crate::schema::LeafSpec> {
                let mut out = ::std::vec::Vec::new();
                $(
                    $crate::derive_reading!(@leaves out, $kind, $field, $ty);
                )*
                out
            }

            fn bind_leaves(&self, out: &mut ::std::vec::Vec<$crate::schema::Cell>) {
                $(
                    $crate::derive_reading!(@bind self, out, $kind, $field);
                )*
            }

            fn from_cells(cells: &[$crate::schema::Cell]) -> $crate::error::EngineResult<Self> {
                let mut __pos: usize = 0;
                $(
                    let $field: $ty = $crate::derive_reading!(@from_cells cells, __pos, $kind, $ty);
                )*
                Ok($name { $( $field ),* })
            }

            fn default_payload() -> Self {
                $name {
                    $(
                        $field: $crate::derive_reading!(@default $kind, $ty),
                    )*
                }
            }
        }
    };

    (@leaves $out:ident, leaf, $field:ident, $ty:ty) => {
        $out.push($crate::schema::LeafSpec {
            path: ::std::vec![::std::stringify!($field)],
            kind: <$ty as $crate::schema::ReadingLeaf>::leaf_kind(),
        });
    };
    (@leaves $out:ident, nested, $field:ident, $ty:ty) => {
        for mut leaf in <$ty as $crate::schema::ReadingPayload>::leaves() {
            leaf.path.insert(0, ::std::stringify!($field));
            $out.push(leaf);
        }
    };

    (@bind $self:ident, $out:ident, leaf, $field:ident) => {
        $out.push($crate::schema::ReadingLeaf::into_cell(&$self.$field));
    };
    (@bind $self:ident, $out:ident, nested, $field:ident) => {
        $crate::schema::ReadingPayload::bind_leaves(&$self.$field, $out);
    };

    (@from_cells $cells:ident, $pos:ident, leaf, $ty:ty) => {{
        let cell = $cells.get($pos).ok_or_else(|| {
            $crate::error::EngineError::bind_failure("not enough cells for payload")
        })?;
        $pos += 1;
        <$ty as $crate::schema::ReadingLeaf>::from_cell(cell)?
    }};
    (@from_cells $cells:ident, $pos:ident, nested, $ty:ty) => {{
        let width = <$ty as $crate::schema::ReadingPayload>::leaves().len();
        let slice = $cells.get($pos..$pos + width).ok_or_else(|| {
            $crate::error::EngineError::bind_failure("not enough cells for nested payload")
        })?;
        $pos += width;
        <$ty as $crate::schema::ReadingPayload>::from_cells(slice)?
    }};

    (@default leaf, $ty:ty) => {
        <$ty as ::std::default::Default>::default()
    };
    (@default nested, $ty:ty) => {
        <$ty as $crate::schema::ReadingPayload>::default_payload()
    };
}
