use std::collections::{BTreeMap, BTreeSet};

use chrono::{Days, NaiveDate};
use serde::Serialize;

/// Result alias for scan operations
pub type Result<T> = std::result::Result<T, ScanError>;

/// Custom error type for scan operations
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Transport failure or unexpected HTTP status
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Expected structure missing from a platform response
    #[error("Parse error: {0}")]
    Parse(String),

    /// Bad campsite configuration
    #[error("Validation error: {0}")]
    Validation(String),
}

impl ScanError {
    /// Stable classification used in failure notifications.
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::Fetch(_) => "fetch",
            ScanError::Parse(_) => "parse",
            ScanError::Validation(_) => "validation",
        }
    }

    /// Create a fetch error for a non-200 response.
    pub fn unexpected_status(url: &str, status: u16) -> Self {
        ScanError::Fetch(format!("Received http code {} instead of 200 from {}", status, url))
    }
}

impl From<reqwest::Error> for ScanError {
    fn from(e: reqwest::Error) -> Self {
        ScanError::Fetch(e.to_string())
    }
}

impl From<serde_json::Error> for ScanError {
    fn from(e: serde_json::Error) -> Self {
        ScanError::Parse(format!("Invalid JSON: {}", e))
    }
}

/// Error raised by a notifier collaborator
#[derive(thiserror::Error, Debug)]
#[error("Notification failed: {0}")]
pub struct NotifyError(pub String);

/// Site name to available dates.
///
/// Dates are kept in an ordered set per site, so overlapping fetch windows
/// never produce duplicates and two maps compare by value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AvailabilityMap {
    sites: BTreeMap<String, BTreeSet<NaiveDate>>,
}

impl AvailabilityMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a single available date for a site
    pub fn add(&mut self, site: impl Into<String>, date: NaiveDate) {
        self.sites.entry(site.into()).or_default().insert(date);
    }

    /// Record several available dates for a site. An empty iterator leaves the map untouched.
    pub fn extend_site<I>(&mut self, site: &str, dates: I)
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let mut dates = dates.into_iter().peekable();
        if dates.peek().is_none() {
            return;
        }
        self.sites.entry(site.to_string()).or_default().extend(dates);
    }

    /// Fold another map into this one
    pub fn merge(&mut self, other: AvailabilityMap) {
        for (site, dates) in other.sites {
            self.sites.entry(site).or_default().extend(dates);
        }
    }

    /// Number of sites with at least one available date
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Whether no site has availability
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Available dates for one site
    pub fn dates(&self, site: &str) -> Option<&BTreeSet<NaiveDate>> {
        self.sites.get(site)
    }

    /// Iterate sites and their dates, ordered by site name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<NaiveDate>)> {
        self.sites.iter().map(|(site, dates)| (site.as_str(), dates))
    }

    /// Keep only the sites whose name satisfies `keep`
    pub fn retain_sites<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.sites.retain(|site, _| keep(site));
    }

    /// Invert the map: each date with the sorted sites available on it
    pub fn by_date(&self) -> BTreeMap<NaiveDate, Vec<&str>> {
        let mut date_to_sites: BTreeMap<NaiveDate, Vec<&str>> = BTreeMap::new();
        for (site, dates) in &self.sites {
            for date in dates {
                date_to_sites.entry(*date).or_default().push(site.as_str());
            }
        }
        // BTreeMap iteration already yields sites in order.
        date_to_sites
    }
}

impl<S: Into<String>> FromIterator<(S, NaiveDate)> for AvailabilityMap {
    fn from_iter<T: IntoIterator<Item = (S, NaiveDate)>>(iter: T) -> Self {
        let mut map = AvailabilityMap::new();
        for (site, date) in iter {
            map.add(site, date);
        }
        map
    }
}

/// Half-open `[start, end)` range of calendar dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    /// First date in the range
    pub start: NaiveDate,
    /// First date past the range
    pub end: NaiveDate,
}

impl DateWindow {
    /// Create a new window
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Start date of each stride needed to cover the window.
    pub fn strides(&self, stride_days: u64) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        let step = Days::new(stride_days.max(1));
        std::iter::successors((self.start < end).then_some(self.start), move |current| {
            current.checked_add_days(step).filter(|next| *next < end)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_duplicate_dates_collapse() {
        let mut map = AvailabilityMap::new();
        map.add("CB12", date(2024, 3, 1));
        map.add("CB12", date(2024, 3, 1));
        map.extend_site("CB12", [date(2024, 3, 2), date(2024, 3, 1)]);

        assert_eq!(map.len(), 1);
        assert_eq!(map.dates("CB12").unwrap().len(), 2);
    }

    #[test]
    fn test_extend_site_with_no_dates_adds_nothing() {
        let mut map = AvailabilityMap::new();
        map.extend_site("A3", Vec::new());
        assert!(map.is_empty());
    }

    #[test]
    fn test_by_date_sorts_dates_and_sites() {
        let map: AvailabilityMap = [
            ("CB2", date(2024, 3, 2)),
            ("CB1", date(2024, 3, 2)),
            ("CB1", date(2024, 3, 1)),
        ]
        .into_iter()
        .collect();

        let by_date = map.by_date();
        let dates: Vec<_> = by_date.keys().copied().collect();
        assert_eq!(dates, vec![date(2024, 3, 1), date(2024, 3, 2)]);
        assert_eq!(by_date[&date(2024, 3, 2)], vec!["CB1", "CB2"]);
    }

    #[test]
    fn test_maps_compare_by_value() {
        let a: AvailabilityMap = [("A", date(2024, 1, 1))].into_iter().collect();
        let mut b = AvailabilityMap::new();
        b.add("A", date(2024, 1, 1));
        assert_eq!(a, b);

        b.add("A", date(2024, 1, 2));
        assert_ne!(a, b);
    }

    #[test]
    fn test_strides_cover_window() {
        let window = DateWindow::new(date(2024, 1, 1), date(2024, 1, 30));
        let starts: Vec<_> = window.strides(14).collect();
        assert_eq!(
            starts,
            vec![date(2024, 1, 1), date(2024, 1, 15), date(2024, 1, 29)]
        );
    }

    #[test]
    fn test_empty_window_has_no_strides() {
        let window = DateWindow::new(date(2024, 1, 10), date(2024, 1, 10));
        assert_eq!(window.strides(21).count(), 0);
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(ScanError::Fetch("x".into()).kind(), "fetch");
        assert_eq!(ScanError::Parse("x".into()).kind(), "parse");
        assert_eq!(ScanError::Validation("x".into()).kind(), "validation");
    }
}
