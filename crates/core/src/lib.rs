//! Pocketshop Core - Shared types library.
//!
//! This crate provides common types used across all Pocketshop components:
//! - `storefront` - Catalog client, list coordinator and cart store
//! - `cli` - Terminal front-end driving the storefront library
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no timers,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs, quantities, prices and view modes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
