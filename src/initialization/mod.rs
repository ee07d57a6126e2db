//! Initialization of process-wide resources.
//!
//! This module sets up:
//! - Logger (with custom formatting)
//! - Nameserver used for TLSA queries

mod logger;
mod resolver;

pub use logger::init_logger_with;
pub use resolver::{nameserver_address, parse_nameserver};
