use std::collections::HashMap;

use serde::Deserialize;

/// Capacity rating of a campsite that sleeps a single party.
pub const SINGLE_CAPACITY: &str = "Single";

/// Campsite type that is never considered, even when it is free.
pub const EXCLUDED_CAMPSITE_TYPE: &str = "EQUESTRIAN NONELECTRIC";

/// Status string for a bookable night.
pub const AVAILABLE_STATUS: &str = "Available";

/// Response structure from the campground month availability API
#[derive(Debug, Deserialize)]
pub struct CampgroundMonthResponse {
    /// Campsites keyed by campsite id
    #[serde(default)]
    pub campsites: HashMap<String, CampsiteMonthData>,
}

/// Campsite availability data for one month
#[derive(Debug, Deserialize)]
pub struct CampsiteMonthData {
    /// Night status keyed by `YYYY-MM-DDT00:00:00Z`
    #[serde(default)]
    pub availabilities: HashMap<String, String>,
    /// Campsite id as reported in the body
    pub campsite_id: Option<String>,
    /// `Single`, `Group`, ...
    pub capacity_rating: Option<String>,
    /// `STANDARD NONELECTRIC`, `TENT ONLY NONELECTRIC`, ...
    pub campsite_type: Option<String>,
    /// Loop name
    #[serde(rename = "loop")]
    pub campsite_loop: Option<String>,
}

impl CampsiteMonthData {
    /// Whether this campsite counts towards availability at all.
    pub fn is_eligible(&self) -> bool {
        self.capacity_rating.as_deref() == Some(SINGLE_CAPACITY)
            && self.campsite_type.as_deref() != Some(EXCLUDED_CAMPSITE_TYPE)
    }

    /// Whether the night with the given payload key is bookable.
    pub fn is_available_on(&self, date_key: &str) -> bool {
        self.availabilities.get(date_key).map(String::as_str) == Some(AVAILABLE_STATUS)
    }
}

/// Response structure from the permit month availability API
#[derive(Debug, Deserialize)]
pub struct PermitMonthResponse {
    /// Wrapped payload
    pub payload: PermitPayload,
}

/// Permit availability payload
#[derive(Debug, Deserialize)]
pub struct PermitPayload {
    /// Quota per permit sub-site (division) id
    #[serde(default)]
    pub availability: HashMap<String, PermitSiteAvailability>,
}

/// Quota of a single permit sub-site
#[derive(Debug, Deserialize)]
pub struct PermitSiteAvailability {
    /// Quota keyed by `YYYY-MM-DDT00:00:00Z`
    #[serde(default)]
    pub date_availability: HashMap<String, PermitDateAvailability>,
}

/// Quota for a single date
#[derive(Debug, Deserialize)]
pub struct PermitDateAvailability {
    /// Permits still available
    #[serde(default)]
    pub remaining: i64,
    /// Total quota
    #[serde(default)]
    pub total: i64,
}

impl PermitSiteAvailability {
    /// Whether `party_size` permits are still available on the given night.
    pub fn has_room_for(&self, date_key: &str, party_size: u32) -> bool {
        self.date_availability
            .get(date_key)
            .is_some_and(|quota| quota.remaining >= i64::from(party_size))
    }
}

/// Errors returned by the recreation.gov client
#[derive(thiserror::Error, Debug)]
pub enum RecGovError {
    /// Transport level failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success status
    #[error("API error: {0}")]
    Api(String),

    /// Rate limited by recreation.gov
    #[error("Rate limited by recreation.gov")]
    RateLimited,

    /// Request rejected as unauthenticated
    #[error("Authentication failed with recreation.gov")]
    AuthenticationFailed,

    /// Facility or permit does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Body could not be decoded
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),
}
