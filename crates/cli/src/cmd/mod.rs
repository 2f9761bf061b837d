//! CLI command implementations

pub mod check;
pub mod clear_cache;
pub mod config;
pub mod run;
pub mod status;
