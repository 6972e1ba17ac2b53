use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use futures_util::future::try_join_all;
use reqwest::header::{ACCEPT, CACHE_CONTROL, PRAGMA, USER_AGENT};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::months::{format_date_key, format_month_param, months_spanned, nights_from};
use crate::types::*;

/// Base URL of the recreation.gov internal API
pub const DEFAULT_BASE_URL: &str = "https://www.recreation.gov/api";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

/// Client for interacting with recreation.gov month availability endpoints
#[derive(Debug, Clone)]
pub struct RecGovClient {
    client: Client,
    base_url: String,
}

impl RecGovClient {
    /// Create a client against the public recreation.gov API
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom base URL
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Per-night availability of single, non-equestrian campsites in a campground.
    ///
    /// One request is issued per calendar month spanned by the stay. The result
    /// has exactly `nights` entries, index 0 being `start_date`.
    pub async fn get_campground_availability(
        &self,
        facility_id: &str,
        start_date: NaiveDate,
        nights: u32,
    ) -> Result<Vec<bool>, RecGovError> {
        debug!(
            "Fetching campground availability for facility {} from {} ({} nights)",
            facility_id, start_date, nights
        );

        let months = months_spanned(start_date, nights);
        let responses = try_join_all(
            months
                .iter()
                .map(|month| self.get_campground_month(facility_id, *month)),
        )
        .await?;

        let by_month: Vec<_> = months.into_iter().zip(responses).collect();
        Ok(campground_vector(&by_month, start_date, nights))
    }

    /// Per-night permit availability across the configured sub-sites.
    ///
    /// A night is available when any of `site_ids` still has at least
    /// `party_size` permits left.
    pub async fn get_permit_availability(
        &self,
        permit_id: &str,
        site_ids: &[String],
        party_size: u32,
        start_date: NaiveDate,
        nights: u32,
    ) -> Result<Vec<bool>, RecGovError> {
        debug!(
            "Fetching permit availability for permit {} from {} ({} nights, {} people)",
            permit_id, start_date, nights, party_size
        );

        let months = months_spanned(start_date, nights);
        let responses = try_join_all(
            months
                .iter()
                .map(|month| self.get_permit_month(permit_id, *month)),
        )
        .await?;

        let by_month: Vec<_> = months.into_iter().zip(responses).collect();
        Ok(permit_vector(
            &by_month, site_ids, party_size, start_date, nights,
        ))
    }

    /// Raw campground payload for the month starting at `month`
    pub async fn get_campground_month(
        &self,
        facility_id: &str,
        month: NaiveDate,
    ) -> Result<CampgroundMonthResponse, RecGovError> {
        let url = format!(
            "{}/camps/availability/campground/{}/month",
            self.base_url, facility_id
        );
        self.get_month(&url, month).await
    }

    /// Raw permit payload for the month starting at `month`
    pub async fn get_permit_month(
        &self,
        permit_id: &str,
        month: NaiveDate,
    ) -> Result<PermitMonthResponse, RecGovError> {
        let url = format!("{}/permits/{}/availability/month", self.base_url, permit_id);
        self.get_month(&url, month).await
    }

    async fn get_month<T: DeserializeOwned>(
        &self,
        url: &str,
        month: NaiveDate,
    ) -> Result<T, RecGovError> {
        let start_date_param = format_month_param(month);
        debug!("Making request to: {}?start_date={}", url, start_date_param);

        let response = self
            .client
            .get(url)
            .query(&[("start_date", start_date_param.as_str())])
            .header(ACCEPT, "application/json, text/plain, */*")
            .header(CACHE_CONTROL, "no-cache, no-store, must-revalidate")
            .header(PRAGMA, "no-cache")
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await?;

        let response = check_status(response, url).await?;
        let body = response.text().await?;

        Ok(serde_json::from_str(&body)?)
    }
}

async fn check_status(response: Response, url: &str) -> Result<Response, RecGovError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read response body".to_string());
    warn!("API request failed with status {}: {}", status, body);

    match status.as_u16() {
        429 => Err(RecGovError::RateLimited),
        401 | 403 => Err(RecGovError::AuthenticationFailed),
        404 => Err(RecGovError::NotFound(url.to_string())),
        _ => Err(RecGovError::Api(format!("HTTP {} - {}", status, body))),
    }
}

fn index_by_month<T>(months: &[(NaiveDate, T)]) -> HashMap<(i32, u32), &T> {
    months
        .iter()
        .map(|(month, payload)| ((month.year(), month.month()), payload))
        .collect()
}

/// Fold campground month payloads into one entry per requested night.
///
/// Each night is looked up in the payload of its own month. Nights missing
/// from every payload are unavailable.
pub fn campground_vector(
    months: &[(NaiveDate, CampgroundMonthResponse)],
    start_date: NaiveDate,
    nights: u32,
) -> Vec<bool> {
    let by_month = index_by_month(months);

    nights_from(start_date, nights)
        .into_iter()
        .map(|night| {
            let date_key = format_date_key(night);
            by_month
                .get(&(night.year(), night.month()))
                .is_some_and(|month| {
                    month
                        .campsites
                        .values()
                        .any(|site| site.is_eligible() && site.is_available_on(&date_key))
                })
        })
        .collect()
}

/// Fold permit month payloads into one entry per requested night.
pub fn permit_vector(
    months: &[(NaiveDate, PermitMonthResponse)],
    site_ids: &[String],
    party_size: u32,
    start_date: NaiveDate,
    nights: u32,
) -> Vec<bool> {
    for (month, response) in months {
        for site_id in site_ids {
            if !response.payload.availability.contains_key(site_id) {
                warn!(
                    "Permit site {} missing from payload for month {}",
                    site_id, month
                );
            }
        }
    }

    let by_month = index_by_month(months);

    nights_from(start_date, nights)
        .into_iter()
        .map(|night| {
            let date_key = format_date_key(night);
            by_month
                .get(&(night.year(), night.month()))
                .is_some_and(|month| {
                    site_ids.iter().any(|site_id| {
                        month
                            .payload
                            .availability
                            .get(site_id)
                            .is_some_and(|site| site.has_room_for(&date_key, party_size))
                    })
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn campground_month(body: serde_json::Value) -> CampgroundMonthResponse {
        serde_json::from_value(body).unwrap()
    }

    fn permit_month(body: serde_json::Value) -> PermitMonthResponse {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_single_tent_site_counts_and_group_site_does_not() {
        let month = campground_month(json!({
            "campsites": {
                "A": {
                    "capacity_rating": "Single",
                    "campsite_type": "TENT ONLY",
                    "availabilities": {
                        "2024-07-01T00:00:00Z": "Available",
                        "2024-07-02T00:00:00Z": "Reserved"
                    }
                },
                "B": {
                    "capacity_rating": "Group",
                    "campsite_type": "GROUP STANDARD NONELECTRIC",
                    "availabilities": {
                        "2024-07-02T00:00:00Z": "Available"
                    }
                }
            }
        }));

        let vector = campground_vector(&[(date(2024, 7, 1), month)], date(2024, 7, 1), 2);
        assert_eq!(vector, vec![true, false]);
    }

    #[test]
    fn test_equestrian_site_is_excluded() {
        let month = campground_month(json!({
            "campsites": {
                "E": {
                    "capacity_rating": "Single",
                    "campsite_type": "EQUESTRIAN NONELECTRIC",
                    "availabilities": { "2024-07-01T00:00:00Z": "Available" }
                }
            }
        }));

        let vector = campground_vector(&[(date(2024, 7, 1), month)], date(2024, 7, 1), 1);
        assert_eq!(vector, vec![false]);
    }

    #[test]
    fn test_campground_vector_is_aligned_across_months() {
        let july = campground_month(json!({
            "campsites": {
                "1": {
                    "capacity_rating": "Single",
                    "campsite_type": "STANDARD NONELECTRIC",
                    "availabilities": { "2024-07-31T00:00:00Z": "Available" }
                }
            }
        }));
        // August payload omits Aug 1 entirely.
        let august = campground_month(json!({
            "campsites": {
                "1": {
                    "capacity_rating": "Single",
                    "campsite_type": "STANDARD NONELECTRIC",
                    "availabilities": { "2024-08-02T00:00:00Z": "Available" }
                }
            }
        }));

        let vector = campground_vector(
            &[(date(2024, 7, 1), july), (date(2024, 8, 1), august)],
            date(2024, 7, 30),
            4,
        );
        assert_eq!(vector, vec![false, true, false, true]);
    }

    #[test]
    fn test_permit_vector_checks_party_size_and_configured_sites() {
        let month = permit_month(json!({
            "payload": {
                "availability": {
                    "100": {
                        "date_availability": {
                            "2024-07-01T00:00:00Z": { "remaining": 4, "total": 10 },
                            "2024-07-02T00:00:00Z": { "remaining": 1, "total": 10 }
                        }
                    },
                    "200": {
                        "date_availability": {
                            "2024-07-03T00:00:00Z": { "remaining": 9, "total": 10 }
                        }
                    }
                }
            }
        }));

        let sites = vec!["100".to_string(), "999".to_string()];
        let vector = permit_vector(&[(date(2024, 7, 1), month)], &sites, 2, date(2024, 7, 1), 3);

        // Night 3 is only free at site 200, which is not configured.
        assert_eq!(vector, vec![true, false, false]);
    }

    #[tokio::test]
    async fn test_get_campground_availability_requests_each_month() {
        let mut server = mockito::Server::new_async().await;

        let july = server
            .mock("GET", "/camps/availability/campground/232447/month")
            .match_query(Matcher::UrlEncoded(
                "start_date".into(),
                "2024-07-01T00:00:00.000Z".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "campsites": {
                        "1": {
                            "capacity_rating": "Single",
                            "campsite_type": "STANDARD NONELECTRIC",
                            "availabilities": { "2024-07-31T00:00:00Z": "Available" }
                        }
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let august = server
            .mock("GET", "/camps/availability/campground/232447/month")
            .match_query(Matcher::UrlEncoded(
                "start_date".into(),
                "2024-08-01T00:00:00.000Z".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "campsites": {
                        "1": {
                            "capacity_rating": "Single",
                            "campsite_type": "STANDARD NONELECTRIC",
                            "availabilities": { "2024-08-01T00:00:00Z": "Available" }
                        }
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = RecGovClient::with_base_url(Client::new(), server.url());
        let vector = client
            .get_campground_availability("232447", date(2024, 7, 31), 2)
            .await
            .unwrap();

        assert_eq!(vector, vec![true, true]);
        july.assert_async().await;
        august.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_permit_availability() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/permits/233262/availability/month")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({
                    "payload": {
                        "availability": {
                            "166": {
                                "date_availability": {
                                    "2024-09-10T00:00:00Z": { "remaining": 2, "total": 2 }
                                }
                            }
                        }
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = RecGovClient::with_base_url(Client::new(), server.url());
        let vector = client
            .get_permit_availability("233262", &["166".to_string()], 2, date(2024, 9, 10), 2)
            .await
            .unwrap();

        assert_eq!(vector, vec![true, false]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/camps/availability/campground/1/month")
            .match_query(Matcher::Any)
            .with_status(429)
            .create_async()
            .await;
        server
            .mock("GET", "/camps/availability/campground/2/month")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("GET", "/camps/availability/campground/3/month")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let client = RecGovClient::with_base_url(Client::new(), server.url());
        let start = date(2024, 7, 1);

        assert!(matches!(
            client.get_campground_availability("1", start, 1).await,
            Err(RecGovError::RateLimited)
        ));
        assert!(matches!(
            client.get_campground_availability("2", start, 1).await,
            Err(RecGovError::NotFound(_))
        ));
        assert!(matches!(
            client.get_campground_availability("3", start, 1).await,
            Err(RecGovError::Parse(_))
        ));
    }
}
