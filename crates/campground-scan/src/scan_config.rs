//! Loading of the job file.
//!
//! The file holds two optional mappings, `campsites` and `permits`, each from
//! a source name to a list of entries:
//!
//! ```yaml
//! campsites:
//!   reserve_california:
//!     - name: Pfeiffer Big Sur
//!       facility_id: 690
//!       start_date: 07-01-2024
//!       number_of_nights: 3
//!       consecutive_nights_required: 2
//! permits:
//!   recreation_gov:
//!     - name: Half Dome
//!       permit_id: 234652
//!       start_date: 07-01-2024
//!       number_of_nights: 1
//!       number_of_permits: 2
//!       consecutive_nights_required: 1
//!       sites:
//!         - id: 44585917
//! ```
//!
//! Every entry is resolved on its own; a bad entry is reported in
//! [`LoadedQueries::rejected`] and the others are still scheduled.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use config::{Config, File, FileFormat, Value};
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

use crate::scan_types::{CampsiteQuery, START_DATE_FORMAT, ScanError, Source};

/// Environment variable that may hold the whole job file
pub const CAMPSITES_ENV: &str = "CAMPSITES";

#[derive(Debug, Default, Deserialize)]
struct ScanFile {
    campsites: Option<BTreeMap<String, Vec<Value>>>,
    permits: Option<BTreeMap<String, Vec<Value>>>,
}

/// Campsite entry as written in the job file
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CampsiteEntry {
    /// Display name
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    /// Facility id on the source platform
    #[validate(length(min = 1, message = "facility_id must not be empty"))]
    pub facility_id: String,
    /// First night, `MM-DD-YYYY`
    pub start_date: String,
    /// Window length
    #[validate(range(min = 1, message = "number_of_nights must be at least 1"))]
    pub number_of_nights: u32,
    /// Required run of consecutive free nights
    #[validate(range(min = 1, message = "consecutive_nights_required must be at least 1"))]
    pub consecutive_nights_required: u32,
}

/// Permit sub-site reference
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PermitSite {
    /// Division id
    pub id: String,
}

/// Permit entry as written in the job file
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PermitEntry {
    /// Display name
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    /// Permit id on recreation.gov
    #[validate(length(min = 1, message = "permit_id must not be empty"))]
    pub permit_id: String,
    /// First night, `MM-DD-YYYY`
    pub start_date: String,
    /// Window length
    #[validate(range(min = 1, message = "number_of_nights must be at least 1"))]
    pub number_of_nights: u32,
    /// Party size
    #[validate(range(min = 1, message = "number_of_permits must be at least 1"))]
    pub number_of_permits: u32,
    /// Sub-sites to consider
    #[validate(length(min = 1, message = "sites must not be empty"))]
    pub sites: Vec<PermitSite>,
    /// Required run of consecutive free nights
    #[validate(range(min = 1, message = "consecutive_nights_required must be at least 1"))]
    pub consecutive_nights_required: u32,
}

/// An entry that could not be turned into a query
#[derive(Debug)]
pub struct RejectedEntry {
    /// `campsites` or `permits`
    pub section: &'static str,
    /// Source name as written
    pub source: String,
    /// Entry name, when it could be read
    pub name: Option<String>,
    /// Why the entry was rejected
    pub error: ScanError,
}

/// Result of loading a job file
#[derive(Debug, Default)]
pub struct LoadedQueries {
    /// Entries ready to be scheduled, in file order per section
    pub queries: Vec<CampsiteQuery>,
    /// Entries that were skipped
    pub rejected: Vec<RejectedEntry>,
}

/// Parse a `MM-DD-YYYY` date
pub fn parse_start_date(value: &str) -> Result<NaiveDate, ScanError> {
    NaiveDate::parse_from_str(value.trim(), START_DATE_FORMAT)
        .map_err(|_| ScanError::InvalidDate(value.to_string()))
}

/// Load the job file at `path`; only `.yaml` and `.yml` files are accepted
pub fn load_from_path(path: &Path) -> Result<LoadedQueries, ScanError> {
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );
    if !is_yaml {
        return Err(ScanError::ConfigError(format!(
            "{} is not a YAML file",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ScanError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    load_from_str(&contents)
}

/// Load a job file from its YAML text
pub fn load_from_str(contents: &str) -> Result<LoadedQueries, ScanError> {
    let file: ScanFile = Config::builder()
        .add_source(File::from_str(contents, FileFormat::Yaml))
        .build()
        .and_then(|config| config.try_deserialize())
        .map_err(|e| ScanError::ConfigError(format!("Failed to parse job file: {}", e)))?;

    let mut loaded = LoadedQueries::default();

    for (source, entries) in file.campsites.unwrap_or_default() {
        for value in entries {
            let name = entry_name(&value);
            match resolve_campsite(&source, value) {
                Ok(query) => loaded.queries.push(query),
                Err(error) => loaded.rejected.push(RejectedEntry {
                    section: "campsites",
                    source: source.clone(),
                    name,
                    error,
                }),
            }
        }
    }

    for (source, entries) in file.permits.unwrap_or_default() {
        for value in entries {
            let name = entry_name(&value);
            match resolve_permit(&source, value) {
                Ok(query) => loaded.queries.push(query),
                Err(error) => loaded.rejected.push(RejectedEntry {
                    section: "permits",
                    source: source.clone(),
                    name,
                    error,
                }),
            }
        }
    }

    debug!(
        "Loaded {} queries, rejected {} entries",
        loaded.queries.len(),
        loaded.rejected.len()
    );
    Ok(loaded)
}

fn entry_name(value: &Value) -> Option<String> {
    value
        .clone()
        .into_table()
        .ok()?
        .remove("name")?
        .into_string()
        .ok()
}

fn decode<T: for<'de> Deserialize<'de> + Validate>(value: Value) -> Result<T, ScanError> {
    let entry: T = value
        .try_deserialize()
        .map_err(|e| ScanError::ConfigError(format!("Malformed entry: {}", e)))?;
    entry
        .validate()
        .map_err(|e| ScanError::Validation(e.to_string()))?;
    Ok(entry)
}

fn resolve_campsite(source: &str, value: Value) -> Result<CampsiteQuery, ScanError> {
    let platform = source.to_ascii_lowercase();
    if !matches!(
        platform.as_str(),
        "reserve_california" | "recreation_gov" | "reserve_america"
    ) {
        return Err(ScanError::UnsupportedSource(source.to_string()));
    }

    let entry: CampsiteEntry = decode(value)?;
    let facility_id = entry.facility_id;
    Ok(CampsiteQuery {
        start_date: parse_start_date(&entry.start_date)?,
        name: entry.name,
        number_of_nights: entry.number_of_nights,
        consecutive_nights_required: entry.consecutive_nights_required,
        source: match platform.as_str() {
            "reserve_california" => Source::ReserveCalifornia { facility_id },
            "reserve_america" => Source::ReserveAmerica { facility_id },
            _ => Source::RecreationGovCampground { facility_id },
        },
    })
}

fn resolve_permit(source: &str, value: Value) -> Result<CampsiteQuery, ScanError> {
    if !source.eq_ignore_ascii_case("recreation_gov") {
        return Err(ScanError::UnsupportedSource(source.to_string()));
    }

    let entry: PermitEntry = decode(value)?;
    Ok(CampsiteQuery {
        start_date: parse_start_date(&entry.start_date)?,
        name: entry.name,
        number_of_nights: entry.number_of_nights,
        consecutive_nights_required: entry.consecutive_nights_required,
        source: Source::RecreationGovPermit {
            permit_id: entry.permit_id,
            site_ids: entry.sites.into_iter().map(|site| site.id).collect(),
            number_of_permits: entry.number_of_permits,
        },
    })
}
