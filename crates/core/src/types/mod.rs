//! Core types for Pocketshop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod quantity;
pub mod view;

pub use id::*;
pub use price::{CurrencyCode, Price};
pub use quantity::{Quantity, QuantityError};
pub use view::ViewMode;
