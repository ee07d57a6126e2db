//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (defaults, protocol limits)
//! - The library `Config` and the CLI `Opt` it is built from

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{usage_error_message, Config, LogFormat, LogLevel, MinValidity, Opt};
