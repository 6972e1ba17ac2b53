use chrono::NaiveDate;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::{debug, warn};

use crate::types::*;

/// Base URL of the UseDirect reservation backend
pub const DEFAULT_BASE_URL: &str = "https://calirdr.usedirect.com";

/// Client for the ReserveCalifornia grid search
#[derive(Debug, Clone)]
pub struct ReserveCaliforniaClient {
    client: Client,
    base_url: String,
}

impl ReserveCaliforniaClient {
    /// Create a client against the public endpoint
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom base URL
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Per-night availability of non-ADA units at a facility.
    pub async fn get_facility_availability(
        &self,
        facility_id: &str,
        start_date: NaiveDate,
        nights: u32,
    ) -> Result<Vec<bool>, ReserveCaliforniaError> {
        let response = self.grid_search(facility_id, start_date).await?;
        Ok(availability_vector(&response, nights))
    }

    /// Run a raw grid search for a facility starting at `start_date`
    pub async fn grid_search(
        &self,
        facility_id: &str,
        start_date: NaiveDate,
    ) -> Result<GridSearchResponse, ReserveCaliforniaError> {
        let url = format!("{}/rdr/rdr/search/grid", self.base_url);
        let request = GridSearchRequest {
            start_date: start_date.format("%m-%d-%Y").to_string(),
            facility_id: facility_id.to_string(),
            sleeping_unit_id: 0,
            unit_type_id: 0,
            unit_category_id: 0,
        };

        debug!("Grid search for facility {} starting {}", facility_id, start_date);

        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json, text/javascript, */*; q=0.01")
            .header(CONTENT_TYPE, "application/json")
            .header("X-Remote-IP", "127.0.0.1")
            .header("X-Originating-IP", "127.0.0.1")
            .header("X-Forwarded-For", "127.0.0.1")
            .header("X-Remote-Addr", "127.0.0.1")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            warn!("Grid search failed with status {}: {}", status, body);

            return match status.as_u16() {
                429 => Err(ReserveCaliforniaError::RateLimited),
                401 | 403 => Err(ReserveCaliforniaError::AuthenticationFailed),
                404 => Err(ReserveCaliforniaError::NotFound(facility_id.to_string())),
                _ => Err(ReserveCaliforniaError::Api(format!("HTTP {} - {}", status, body))),
            };
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Fold a grid search into one entry per night.
///
/// A night is available when any non-ADA unit reports it free. Each unit's
/// slices are taken in date order and truncated to `nights`.
pub fn availability_vector(response: &GridSearchResponse, nights: u32) -> Vec<bool> {
    let mut days_available = vec![false; nights as usize];

    let Some(units) = &response.facility.units else {
        return days_available;
    };

    for unit in units.values().filter(|unit| !unit.is_ada) {
        for (day, slice) in days_available.iter_mut().zip(unit.slices.values()) {
            *day |= slice.is_free;
        }
    }

    days_available
}
