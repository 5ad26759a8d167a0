//! CLI command implementations.

pub mod backend;
pub mod categories;
pub mod migrate;
