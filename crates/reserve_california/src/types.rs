use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Grid search request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GridSearchRequest {
    /// First night, `MM-DD-YYYY`
    pub start_date: String,
    /// Facility id as a string
    pub facility_id: String,
    /// Always 0 (any sleeping unit)
    pub sleeping_unit_id: u32,
    /// Always 0 (any unit type)
    pub unit_type_id: u32,
    /// Always 0 (any unit category)
    pub unit_category_id: u32,
}

/// Grid search response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GridSearchResponse {
    /// The facility searched
    pub facility: GridFacility,
}

/// Facility section of a grid search response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GridFacility {
    /// Facility name, when reported
    pub name: Option<String>,
    /// Units keyed by unit id
    pub units: Option<HashMap<String, GridUnit>>,
}

/// A single bookable unit
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GridUnit {
    /// Unit display name
    pub name: Option<String>,
    /// Accessibility-designated unit
    #[serde(default)]
    pub is_ada: bool,
    /// Per-date slices, ordered by date key
    #[serde(default)]
    pub slices: BTreeMap<String, GridSlice>,
}

/// Availability of a unit on one date
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GridSlice {
    /// Whether the unit can be booked for that night
    #[serde(default)]
    pub is_free: bool,
}

/// Errors returned by the ReserveCalifornia client
#[derive(thiserror::Error, Debug)]
pub enum ReserveCaliforniaError {
    /// Transport level failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success status
    #[error("API error: {0}")]
    Api(String),

    /// Rate limited by the grid search endpoint
    #[error("Rate limited by ReserveCalifornia")]
    RateLimited,

    /// Request rejected as unauthenticated
    #[error("Authentication failed with ReserveCalifornia")]
    AuthenticationFailed,

    /// Facility does not exist
    #[error("Facility not found: {0}")]
    NotFound(String),

    /// Body could not be decoded
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),
}
