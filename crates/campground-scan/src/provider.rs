use async_trait::async_trait;
use rec_gov::RecGovClient;
use reqwest::Client;
use reserve_california::ReserveCaliforniaClient;

use crate::scan_types::{CampsiteQuery, ScanError, Source};

/// Produces the per-night availability of a query, index 0 being its start date
#[async_trait]
pub trait AvailabilityProvider: Send + Sync {
    /// Fetch one boolean per night in `[start_date, start_date + number_of_nights)`
    async fn fetch(&self, query: &CampsiteQuery) -> Result<Vec<bool>, ScanError>;
}

/// Routes each query to the adapter of its source
#[derive(Debug, Clone)]
pub struct ProviderDispatch {
    reserve_california: ReserveCaliforniaClient,
    rec_gov: RecGovClient,
}

impl ProviderDispatch {
    /// Build both adapters on a shared HTTP client
    pub fn new(client: Client) -> Self {
        Self {
            reserve_california: ReserveCaliforniaClient::new(client.clone()),
            rec_gov: RecGovClient::new(client),
        }
    }

    /// Use preconfigured adapters
    pub fn with_clients(reserve_california: ReserveCaliforniaClient, rec_gov: RecGovClient) -> Self {
        Self {
            reserve_california,
            rec_gov,
        }
    }
}

#[async_trait]
impl AvailabilityProvider for ProviderDispatch {
    async fn fetch(&self, query: &CampsiteQuery) -> Result<Vec<bool>, ScanError> {
        let availability = match &query.source {
            Source::ReserveCalifornia { facility_id } => {
                self.reserve_california
                    .get_facility_availability(facility_id, query.start_date, query.number_of_nights)
                    .await?
            }
            Source::RecreationGovCampground { facility_id }
            | Source::ReserveAmerica { facility_id } => {
                self.rec_gov
                    .get_campground_availability(
                        facility_id,
                        query.start_date,
                        query.number_of_nights,
                    )
                    .await?
            }
            Source::RecreationGovPermit {
                permit_id,
                site_ids,
                number_of_permits,
            } => {
                self.rec_gov
                    .get_permit_availability(
                        permit_id,
                        site_ids,
                        *number_of_permits,
                        query.start_date,
                        query.number_of_nights,
                    )
                    .await?
            }
        };

        Ok(availability)
    }
}
