use std::env;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use futures_util::future::join_all;
use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, sleep};
use tracing::{debug, error, info, warn};

use crate::evaluator::evaluate;
use crate::notification_service::NotificationService;
use crate::notification_state::NotificationState;
use crate::provider::AvailabilityProvider;
use crate::scan_types::{CampsiteQuery, ScanError, TickOutcome};

/// Runs queries against their provider and alerts on findings
pub struct ScanExecutor {
    provider: Arc<dyn AvailabilityProvider>,
    notification_service: Arc<dyn NotificationService>,

    /// Alerts already sent per finding, shared by every job
    notification_state: NotificationState,

    config: ScanExecutorConfig,
}

/// Scheduling and deduplication settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanExecutorConfig {
    /// Alerts allowed per finding between resets (default: 1)
    pub notification_cap: u32,

    /// Time between two runs of a job (default: 3 minutes)
    pub poll_interval: Duration,

    /// Upper bound of the random delay before each run (default: 1 minute)
    pub poll_jitter: Duration,

    /// How often notification counts are cleared (default: 4 hours)
    pub reset_interval: Duration,
}

impl Default for ScanExecutorConfig {
    fn default() -> Self {
        Self {
            notification_cap: 1,
            poll_interval: Duration::from_secs(3 * 60),
            poll_jitter: Duration::from_secs(60),
            reset_interval: Duration::from_secs(4 * 60 * 60),
        }
    }
}

impl ScanExecutorConfig {
    /// Read `NOTIFICATION_CAP`, `POLL_INTERVAL_SECS`, `POLL_JITTER_SECS` and
    /// `NOTIFICATION_RESET_SECS`, keeping defaults for unset variables
    pub fn from_env() -> Result<Self, ScanError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ScanError> {
        let defaults = Self::default();
        let number = |key: &str| -> Result<Option<u64>, ScanError> {
            lookup(key)
                .map(|value| {
                    value.trim().parse::<u64>().map_err(|_| {
                        ScanError::ConfigError(format!("{} is not a number: {}", key, value))
                    })
                })
                .transpose()
        };

        let notification_cap = match number("NOTIFICATION_CAP")? {
            Some(cap) => u32::try_from(cap)
                .map_err(|_| ScanError::ConfigError(format!("NOTIFICATION_CAP too large: {}", cap)))?,
            None => defaults.notification_cap,
        };

        let config = Self {
            notification_cap,
            poll_interval: number("POLL_INTERVAL_SECS")?
                .map_or(defaults.poll_interval, Duration::from_secs),
            poll_jitter: number("POLL_JITTER_SECS")?
                .map_or(defaults.poll_jitter, Duration::from_secs),
            reset_interval: number("NOTIFICATION_RESET_SECS")?
                .map_or(defaults.reset_interval, Duration::from_secs),
        };

        if config.poll_interval.is_zero() || config.reset_interval.is_zero() {
            return Err(ScanError::ConfigError(
                "POLL_INTERVAL_SECS and NOTIFICATION_RESET_SECS must be positive".to_string(),
            ));
        }

        Ok(config)
    }
}

impl ScanExecutor {
    /// Create an executor with a fresh notification state
    pub fn new(
        provider: Arc<dyn AvailabilityProvider>,
        notification_service: Arc<dyn NotificationService>,
        config: Option<ScanExecutorConfig>,
    ) -> Self {
        Self {
            provider,
            notification_service,
            notification_state: NotificationState::new(),
            config: config.unwrap_or_default(),
        }
    }

    /// Shared notification counts
    pub fn notification_state(&self) -> &NotificationState {
        &self.notification_state
    }

    /// Active settings
    pub fn config(&self) -> &ScanExecutorConfig {
        &self.config
    }

    /// Run one tick of `query` against today's local date
    pub async fn run_tick(&self, query: &CampsiteQuery) -> TickOutcome {
        self.run_tick_on(query, Local::now().date_naive()).await
    }

    /// Run one tick of `query` as if the current date were `today`.
    ///
    /// Provider errors are logged and reported as [`TickOutcome::Failed`];
    /// they never propagate to the caller.
    pub async fn run_tick_on(&self, query: &CampsiteQuery, today: NaiveDate) -> TickOutcome {
        let job_name = query.job_name();

        if query.is_past(today) {
            info!("Skipping {}, start date has passed", job_name);
            return TickOutcome::Skipped;
        }

        debug!("Checking {}", job_name);

        let availability = match self.provider.fetch(query).await {
            Ok(availability) => availability,
            Err(e) => {
                error!("Failed to fetch availability for {}: {}", job_name, e);
                return TickOutcome::Failed(e);
            }
        };

        let longest_run = evaluate(&availability);
        info!(
            "{} {}",
            job_name,
            availability_summary(&availability, longest_run)
        );
        if longest_run < query.consecutive_nights_required as usize {
            debug!(
                "No availability for {}: longest run {} of {} required",
                job_name, longest_run, query.consecutive_nights_required
            );
            return TickOutcome::Unavailable { longest_run };
        }

        let key = query.notification_key();
        if !self
            .notification_state
            .try_reserve(&key, self.config.notification_cap)
        {
            info!(
                "Availability for {} already notified {} time(s), not notifying",
                job_name, self.config.notification_cap
            );
            return TickOutcome::Suppressed { longest_run };
        }

        match self
            .notification_service
            .send_availability_notification(query)
            .await
        {
            Ok(()) => {
                info!("Sent notification for {}", job_name);
                TickOutcome::Notified { longest_run }
            }
            Err(e) => {
                error!("Failed to send notification for {}: {}", job_name, e);
                TickOutcome::NotifyFailed {
                    longest_run,
                    error: e,
                }
            }
        }
    }

    /// Run every query once, concurrently
    pub async fn run_once(&self, queries: &[CampsiteQuery]) -> Vec<TickOutcome> {
        info!("Running a single pass over {} queries", queries.len());
        join_all(queries.iter().map(|query| self.run_tick(query))).await
    }

    /// Spawn one polling task per query plus the notification reset task.
    ///
    /// The first run of each job happens right away. A job whose start date
    /// has passed stops polling.
    pub fn start(self: &Arc<Self>, queries: Vec<CampsiteQuery>) -> Vec<JoinHandle<()>> {
        info!(
            "Starting scan execution engine with {} jobs, polling every {:?}",
            queries.len(),
            self.config.poll_interval
        );

        let mut handles: Vec<JoinHandle<()>> = queries
            .into_iter()
            .map(|query| {
                let executor = Arc::clone(self);
                tokio::spawn(async move { executor.poll_loop(query).await })
            })
            .collect();

        let executor = Arc::clone(self);
        handles.push(tokio::spawn(async move { executor.reset_loop().await }));

        handles
    }

    async fn poll_loop(&self, query: CampsiteQuery) {
        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let delay = self.jitter();
            if !delay.is_zero() {
                sleep(delay).await;
            }

            if let TickOutcome::Skipped = self.run_tick(&query).await {
                warn!("Retiring job {}", query.job_name());
                return;
            }
        }
    }

    async fn reset_loop(&self) {
        let mut ticker = interval(self.config.reset_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            info!(
                "Resetting notification state ({} findings)",
                self.notification_state.len()
            );
            self.notification_state.reset();
        }
    }

    fn jitter(&self) -> Duration {
        let max_millis = self.config.poll_jitter.as_millis() as u64;
        if max_millis == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=max_millis))
    }
}

/// `days=[..] max_consecutive=N` line logged on every checked tick
fn availability_summary(availability: &[bool], longest_run: usize) -> String {
    format!("days={:?} max_consecutive={}", availability, longest_run)
}
