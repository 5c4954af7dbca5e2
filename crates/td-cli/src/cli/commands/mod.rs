//! CLI command handlers.

pub mod monitor;
pub mod seed;
