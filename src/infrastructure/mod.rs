//! Infrastructure layer providing configuration loading and metrics
//!
//! This module contains the infrastructure components that support the domain
//! layer, including JSON configuration parsing and operational metrics
//! collection.

/// JSON configuration parsing for families and pools
pub mod config;
/// Metrics collection and export functionality
pub mod metrics;

pub use config::*;
pub use metrics::*;
