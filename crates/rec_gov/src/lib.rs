//! # RecGov
//!
//! Clients for the recreation.gov internal availability API. Campground and
//! permit month payloads are folded into one boolean per requested night.

/// HTTP client for the month availability endpoints.
mod client;
pub use client::*;

/// Month spanning and date key formatting.
pub mod months;

/// Payload types and errors for the recreation.gov API.
mod types;
pub use types::*;
