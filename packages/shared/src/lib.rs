//! Utilities shared across the Kotoba packages.

pub mod logger;
pub mod time;
