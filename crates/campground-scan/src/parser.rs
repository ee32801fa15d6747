//! The parser contract and the window pagination shared by every platform.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rand::Rng;
use scraper::Selector;

use crate::cycle_log::CycleLog;
use crate::date_format::format_date;
use crate::scan_types::{AvailabilityMap, DateWindow, Result, ScanError};
use crate::session_manager::{HttpSession, SessionFactory};

/// Turns a platform's responses into a normalized availability map
#[async_trait]
pub trait AvailabilityParser: Send + Sync {
    /// Platform name for logs
    fn platform_name(&self) -> &'static str;

    /// Availability for every window start in `[start, end)`
    async fn parse_availability(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        log: &CycleLog,
    ) -> Result<AvailabilityMap>;
}

/// One platform's single-window request and response handling
#[async_trait]
pub trait WindowFetcher: Send + Sync {
    /// Platform name for logs
    const PLATFORM: &'static str;

    /// Days the platform answers per request
    const STRIDE_DAYS: u64;

    /// Fetch and parse the window starting at `window_start`. `end` is the
    /// overall end of the requested range.
    async fn fetch_window(
        &self,
        session: &dyn HttpSession,
        window_start: NaiveDate,
        end: NaiveDate,
        log: &CycleLog,
    ) -> Result<AvailabilityMap>;
}

/// Randomized pause between window fetches
#[derive(Debug, Clone, Copy)]
pub struct FuzzyDelay {
    min: Duration,
    max: Duration,
}

impl FuzzyDelay {
    /// Uniform 1 to 5 seconds
    pub fn standard() -> Self {
        Self::between(Duration::from_secs(1), Duration::from_secs(5))
    }

    /// Uniform between `min` and `max`
    pub fn between(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    /// No pause at all
    pub fn none() -> Self {
        Self::between(Duration::ZERO, Duration::ZERO)
    }

    fn sample(&self) -> Duration {
        if self.max == self.min {
            return self.min;
        }
        let secs = rand::rng().random_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    /// Sleep for a random duration in range
    pub async fn pause(&self, log: &CycleLog) {
        let duration = self.sample();
        if duration.is_zero() {
            return;
        }
        log.log(format!("Sleeping for {:.2}s...", duration.as_secs_f64()));
        tokio::time::sleep(duration).await;
    }
}

impl Default for FuzzyDelay {
    fn default() -> Self {
        Self::standard()
    }
}

/// Drives a [`WindowFetcher`] stride by stride over the requested range,
/// with a fresh session per window.
pub struct PagedParser<F> {
    fetcher: F,
    sessions: Arc<dyn SessionFactory>,
    delay: FuzzyDelay,
}

impl<F: WindowFetcher> PagedParser<F> {
    /// Create a new paged parser
    pub fn new(fetcher: F, sessions: Arc<dyn SessionFactory>, delay: FuzzyDelay) -> Self {
        Self {
            fetcher,
            sessions,
            delay,
        }
    }
}

#[async_trait]
impl<F: WindowFetcher> AvailabilityParser for PagedParser<F> {
    fn platform_name(&self) -> &'static str {
        F::PLATFORM
    }

    async fn parse_availability(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        log: &CycleLog,
    ) -> Result<AvailabilityMap> {
        log.log(format!(
            "Retrieving availability from {} to {}",
            format_date(start),
            format_date(end)
        ));

        let mut availability = AvailabilityMap::new();
        let mut first = true;

        for window_start in DateWindow::new(start, end).strides(F::STRIDE_DAYS) {
            if !first {
                self.delay.pause(log).await;
            }
            first = false;

            log.log(format!(
                "Getting availability data from start_date {}",
                format_date(window_start)
            ));
            let session = self.sessions.new_session()?;
            let window = self
                .fetcher
                .fetch_window(session.as_ref(), window_start, end, log)
                .await?;
            availability.merge(window);
        }

        Ok(availability)
    }
}

/// Parse a CSS selector, mapping failure into a parse error
pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| ScanError::Parse(format!("Invalid selector '{}': {}", css, e)))
}
