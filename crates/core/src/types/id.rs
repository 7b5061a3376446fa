//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `u32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_u32()`
/// - `From<u32>`, `Into<u32>` and `FromStr` implementations
///
/// # Example
///
/// ```rust
/// # use pocketshop_core::define_id;
/// define_id!(ReviewId);
///
/// let review_id = ReviewId::new(7);
/// assert_eq!(review_id.as_u32(), 7);
/// assert_eq!("7".parse::<ReviewId>().ok(), Some(review_id));
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create a new ID from a u32 value.
            #[must_use]
            pub const fn new(id: u32) -> Self {
                Self(id)
            }

            /// Get the underlying u32 value.
            #[must_use]
            pub const fn as_u32(&self) -> u32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<u32>().map(Self)
            }
        }

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Catalog product ID as assigned by the remote product API.
define_id!(ProductId);
