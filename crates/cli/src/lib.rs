//! Library half of the drivewatch CLI
//!
//! Configuration loading and the tick lock live here so they can be tested
//! without spawning the binary.

pub mod locks;
pub mod system_config;
