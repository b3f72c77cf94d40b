//! Shared utilities supporting the rest of the crate

/// Logger setup and level parsing
pub mod logger;

pub use logger::setup_logger;
