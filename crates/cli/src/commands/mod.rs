//! Subcommand implementations.

pub mod product;
pub mod render;
pub mod search;
pub mod shell;
