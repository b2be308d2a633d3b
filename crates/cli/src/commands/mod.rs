//! CLI subcommand implementations.

pub mod auth;
pub mod migrate;
pub mod mirror;
pub mod products;
