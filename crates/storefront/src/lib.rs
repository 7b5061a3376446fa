//! Pocketshop storefront library.
//!
//! The catalog client, list coordinator, cart store and detail view model
//! behind the `pocketshop` front-end. Nothing here renders anything; views
//! drive these types and draw whatever they expose.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod debounce;
pub mod detail;
pub mod error;
pub mod filters;
pub mod listing;
pub mod navigation;
pub mod resource;
pub mod state;
