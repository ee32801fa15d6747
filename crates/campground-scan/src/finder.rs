//! One campsite's poll cycle: fetch the horizon, keep the sites the
//! subscriber asked for, and decide whether that is worth an email.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Days, Local, NaiveDate, TimeDelta, Utc};
use tracing::{error, warn};

use crate::campsite::SiteFilter;
use crate::cycle_log::CycleLog;
use crate::parser::AvailabilityParser;
use crate::scan_types::{AvailabilityMap, NotifyError, ScanError};

/// Delivers the outcome of a cycle to people
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Tell subscribers which sites are free on which dates
    async fn send_availability(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        availability: &AvailabilityMap,
        log: &CycleLog,
    ) -> Result<(), NotifyError>;

    /// Report a failed cycle along with its log
    async fn send_failure(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        error: &ScanError,
        log: &CycleLog,
    ) -> Result<(), NotifyError>;
}

/// Search horizon and heartbeat settings
#[derive(Debug, Clone)]
pub struct FinderConfig {
    /// Days from today to the first searched night
    pub start_offset_days: u64,
    /// Days from today to the end of the search
    pub horizon_days: u64,
    /// Resend unchanged availability once this much time has passed
    pub refresh_interval: TimeDelta,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            start_offset_days: 1,
            horizon_days: 180,
            refresh_interval: TimeDelta::hours(24),
        }
    }
}

/// Why a cycle notified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyReason {
    /// Filtered availability differs from the last result
    Changed,
    /// Nothing changed but the refresh interval elapsed
    Heartbeat,
}

/// Why a cycle stayed quiet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No matching site has any free date
    Empty,
    /// Same as last time and the heartbeat is not due
    Unchanged,
}

/// Result of the "should notify" decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyDecision {
    /// Send an availability email
    Notify(NotifyReason),
    /// Stay quiet
    Skip(SkipReason),
}

/// What the finder remembers between cycles
#[derive(Debug, Clone, Default)]
pub struct FinderState {
    last_result: Option<AvailabilityMap>,
    last_notified: Option<DateTime<Utc>>,
}

impl FinderState {
    /// Last filtered result seen, if any
    pub fn last_result(&self) -> Option<&AvailabilityMap> {
        self.last_result.as_ref()
    }

    /// When the last availability email was decided on
    pub fn last_notified(&self) -> Option<DateTime<Utc>> {
        self.last_notified
    }

    /// Decide whether `filtered` warrants a notification and update the
    /// remembered state accordingly.
    ///
    /// Empty results never notify but are still remembered, so the next
    /// non-empty result always counts as a change.
    pub fn decide(
        &mut self,
        filtered: &AvailabilityMap,
        now: DateTime<Utc>,
        refresh_interval: TimeDelta,
    ) -> NotifyDecision {
        if filtered.is_empty() {
            self.last_result = Some(AvailabilityMap::new());
            return NotifyDecision::Skip(SkipReason::Empty);
        }

        let changed = self.last_result.as_ref() != Some(filtered);
        let heartbeat_due = self
            .last_notified
            .is_none_or(|at| now - at > refresh_interval);

        let reason = if changed {
            NotifyReason::Changed
        } else if heartbeat_due {
            NotifyReason::Heartbeat
        } else {
            return NotifyDecision::Skip(SkipReason::Unchanged);
        };

        self.last_result = Some(filtered.clone());
        self.last_notified = Some(now);
        NotifyDecision::Notify(reason)
    }
}

/// How a cycle ended
#[derive(Debug)]
pub enum CycleOutcome {
    /// Availability email sent
    Notified(NotifyReason),
    /// Nothing sent
    Skipped(SkipReason),
    /// Decided to notify but the notifier failed
    NotifyFailed(NotifyError),
    /// The scrape failed; a failure report was attempted
    Failed(ScanError),
}

/// Watches one campsite with one parser
pub struct AvailabilityFinder {
    campsite: String,
    site_filter: SiteFilter,
    parser: Box<dyn AvailabilityParser>,
    notifier: Arc<dyn Notifier>,
    log: CycleLog,
    config: FinderConfig,
    state: FinderState,
}

impl AvailabilityFinder {
    /// Create a new finder
    pub fn new(
        campsite: impl Into<String>,
        site_filter: SiteFilter,
        parser: Box<dyn AvailabilityParser>,
        notifier: Arc<dyn Notifier>,
        log: CycleLog,
        config: FinderConfig,
    ) -> Self {
        Self {
            campsite: campsite.into(),
            site_filter,
            parser,
            notifier,
            log,
            config,
            state: FinderState::default(),
        }
    }

    /// Campsite display name
    pub fn campsite(&self) -> &str {
        &self.campsite
    }

    /// Remembered state
    pub fn state(&self) -> &FinderState {
        &self.state
    }

    /// Run a cycle for the local date
    pub async fn run(&mut self) -> CycleOutcome {
        self.run_at(Local::now().date_naive(), Utc::now()).await
    }

    /// Run a cycle searching from `today` and stamping decisions with `now`
    pub async fn run_at(&mut self, today: NaiveDate, now: DateTime<Utc>) -> CycleOutcome {
        self.log.clear();
        self.log.log(format!("Starting search for {}", self.campsite));

        let start = today
            .checked_add_days(Days::new(self.config.start_offset_days))
            .unwrap_or(today);
        let end = today
            .checked_add_days(Days::new(self.config.horizon_days))
            .unwrap_or(today);

        let result = self.parser.parse_availability(start, end, &self.log).await;
        let outcome = match result {
            Ok(availability) => self.handle_availability(start, end, availability, now).await,
            Err(e) => self.handle_failure(start, end, e).await,
        };

        self.log.log(format!("Finished search for {}", self.campsite));
        outcome
    }

    async fn handle_availability(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
        mut availability: AvailabilityMap,
        now: DateTime<Utc>,
    ) -> CycleOutcome {
        self.log.log("Selecting only requested sites from availability...");
        availability.retain_sites(|site| self.site_filter.matches(site));
        self.log
            .log(format!("Found {} available sites", availability.len()));

        match self
            .state
            .decide(&availability, now, self.config.refresh_interval)
        {
            NotifyDecision::Notify(reason) => {
                self.log.log(format!("Sending availability email ({:?})", reason));
                match self
                    .notifier
                    .send_availability(start, end, &availability, &self.log)
                    .await
                {
                    Ok(()) => CycleOutcome::Notified(reason),
                    Err(e) => {
                        warn!("Availability email for {} failed: {}", self.campsite, e);
                        self.log.log(format!("Failed to send availability email: {}", e));
                        CycleOutcome::NotifyFailed(e)
                    }
                }
            }
            NotifyDecision::Skip(reason) => {
                self.log.log(format!("Not sending email ({:?})", reason));
                CycleOutcome::Skipped(reason)
            }
        }
    }

    async fn handle_failure(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
        e: ScanError,
    ) -> CycleOutcome {
        error!("Search for {} failed: {}", self.campsite, e);
        self.log
            .log(format!("Encountered {} error: {}", e.kind(), e));

        if let Err(notify_error) = self
            .notifier
            .send_failure(start, end, &e, &self.log)
            .await
        {
            warn!(
                "Failure email for {} could not be sent: {}",
                self.campsite, notify_error
            );
        }
        CycleOutcome::Failed(e)
    }
}
