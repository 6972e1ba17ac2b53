use chrono::NaiveDate;
use notification_services::NotificationError;
use rec_gov::RecGovError;
use reserve_california::ReserveCaliforniaError;

/// Date format used by job configuration and alert messages
pub const START_DATE_FORMAT: &str = "%m-%d-%Y";

/// Upstream platform a query is checked against, with the data its adapter needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// ReserveCalifornia state park facility
    ReserveCalifornia {
        /// UseDirect facility id
        facility_id: String,
    },
    /// recreation.gov campground
    RecreationGovCampground {
        /// Campground facility id
        facility_id: String,
    },
    /// recreation.gov campground configured under the `reserve_america` name
    ReserveAmerica {
        /// Campground facility id
        facility_id: String,
    },
    /// recreation.gov permit with explicit sub-sites
    RecreationGovPermit {
        /// Permit id
        permit_id: String,
        /// Sub-site (division) ids to consider
        site_ids: Vec<String>,
        /// Party size the remaining quota must cover
        number_of_permits: u32,
    },
}

impl Source {
    /// Name of the platform as shown in alerts
    pub fn label(&self) -> &'static str {
        match self {
            Source::ReserveCalifornia { .. } => "reserve_california",
            Source::RecreationGovCampground { .. } => "recreation_gov",
            Source::ReserveAmerica { .. } => "reserve_america",
            Source::RecreationGovPermit { .. } => "recreation.gov",
        }
    }

    /// Page where the finding can be booked, when the platform has one per facility
    pub fn booking_url(&self) -> Option<String> {
        match self {
            Source::ReserveCalifornia { .. } => None,
            Source::RecreationGovCampground { facility_id }
            | Source::ReserveAmerica { facility_id } => Some(format!(
                "https://www.recreation.gov/camping/campgrounds/{}",
                facility_id
            )),
            Source::RecreationGovPermit { permit_id, .. } => {
                Some(format!("https://www.recreation.gov/permits/{}", permit_id))
            }
        }
    }

    /// Number of permits requested, for permit sources
    pub fn number_of_permits(&self) -> Option<u32> {
        match self {
            Source::RecreationGovPermit {
                number_of_permits, ..
            } => Some(*number_of_permits),
            _ => None,
        }
    }
}

/// One configured availability check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampsiteQuery {
    /// Display name of the site
    pub name: String,
    /// First night of the stay
    pub start_date: NaiveDate,
    /// Length of the window to look at
    pub number_of_nights: u32,
    /// Minimum run of consecutive free nights worth an alert
    pub consecutive_nights_required: u32,
    /// Where and how to check
    pub source: Source,
}

impl CampsiteQuery {
    /// Deduplication identity of a finding for this query
    pub fn notification_key(&self) -> NotificationKey {
        NotificationKey {
            site_name: self.name.clone(),
            start_date: self.start_date,
            number_of_nights: self.number_of_nights,
            consecutive_nights_required: self.consecutive_nights_required,
            number_of_permits: self.source.number_of_permits(),
        }
    }

    /// Whether the stay starts strictly before `today`
    pub fn is_past(&self, today: NaiveDate) -> bool {
        self.start_date < today
    }

    /// Short label used in logs
    pub fn job_name(&self) -> String {
        format!(
            "{}-{} {}",
            self.source.label(),
            self.name,
            self.start_date.format(START_DATE_FORMAT)
        )
    }
}

/// Identity of an availability finding.
///
/// Source and facility are not part of the key: two queries that only differ
/// there share one notification budget.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NotificationKey {
    /// Display name of the site
    pub site_name: String,
    /// First night of the stay
    pub start_date: NaiveDate,
    /// Length of the window
    pub number_of_nights: u32,
    /// Required run length
    pub consecutive_nights_required: u32,
    /// Requested permits, for permit queries
    pub number_of_permits: Option<u32>,
}

/// What happened during a single tick of a job
#[derive(Debug)]
pub enum TickOutcome {
    /// Start date has passed, no provider call was made
    Skipped,
    /// Longest run was below the requirement
    Unavailable {
        /// Longest run of free nights found
        longest_run: usize,
    },
    /// Requirement met and an alert was delivered
    Notified {
        /// Longest run of free nights found
        longest_run: usize,
    },
    /// Requirement met but the notification cap was already reached
    Suppressed {
        /// Longest run of free nights found
        longest_run: usize,
    },
    /// Requirement met, alert counted but delivery failed
    NotifyFailed {
        /// Longest run of free nights found
        longest_run: usize,
        /// Delivery error
        error: NotificationError,
    },
    /// Provider call failed; treated as no availability for this tick
    Failed(ScanError),
}

/// Custom error type for scan operations
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// recreation.gov adapter error
    #[error("recreation.gov error: {0}")]
    RecGov(#[from] RecGovError),

    /// ReserveCalifornia adapter error
    #[error("ReserveCalifornia error: {0}")]
    ReserveCalifornia(#[from] ReserveCaliforniaError),

    /// Notification transport error
    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    /// HTTP client construction or proxy discovery error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Source name with no adapter
    #[error("Source {0} not supported")]
    UnsupportedSource(String),

    /// Invalid start date
    #[error("Invalid start date {0}: expected MM-DD-YYYY")]
    InvalidDate(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}
