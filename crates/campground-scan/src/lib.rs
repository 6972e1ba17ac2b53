//! # Campground Scan
//!
//! This crate polls campsite and permit availability for a fixed list of
//! configured queries and alerts recipients when a long enough run of
//! consecutive free nights appears. Repeat alerts for the same finding are
//! capped by an in-memory notification state.

/// Types for campground scan operations
mod scan_types;
pub use scan_types::*;

/// Longest-run evaluation of per-night availability
pub mod evaluator;
pub use evaluator::evaluate;

/// Deduplication of availability alerts
mod notification_state;
pub use notification_state::*;

/// Provider adapters behind a single dispatch trait
mod provider;
pub use provider::*;

/// Alert formatting and delivery over email and SMS
mod notification_service;
pub use notification_service::*;

/// YAML job configuration loading
pub mod scan_config;

/// Outbound HTTP client construction
mod transport;
pub use transport::*;

/// Job runner and scheduler
mod executor;
pub use executor::*;
