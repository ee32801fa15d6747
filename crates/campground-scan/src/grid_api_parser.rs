//! JSON grid search API. One POST per window; the response lists every unit
//! of the facility with a slice per night.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::campsite::GridApiSite;
use crate::cycle_log::CycleLog;
use crate::date_format::DateFormat;
use crate::parser::WindowFetcher;
use crate::scan_types::{AvailabilityMap, Result, ScanError};
use crate::session_manager::HttpSession;

/// Fetches one window from the grid search API
pub struct GridApiFetcher {
    site: GridApiSite,
}

impl GridApiFetcher {
    /// Create a fetcher for a site
    pub fn new(site: GridApiSite) -> Self {
        Self { site }
    }

    /// Search body for the window starting at `window_start`
    pub fn search_body(&self, window_start: NaiveDate, end: NaiveDate) -> Value {
        let start = DateFormat::Iso.format(window_start);
        json!({
            "IsADA": false,
            "MinVehicleLength": 0,
            "UnitCategoryId": 0,
            "StartDate": start,
            "WebOnly": true,
            "UnitTypesGroupIds": [],
            "SleepingUnitId": 0,
            "MinDate": start,
            "MaxDate": DateFormat::Iso.format(end),
            "UnitSort": "orderby",
            "InSeasonOnly": true,
            "FacilityId": self.site.facility_id,
            "RestrictADA": false,
        })
    }
}

#[async_trait]
impl WindowFetcher for GridApiFetcher {
    const PLATFORM: &'static str = "grid_api";
    const STRIDE_DAYS: u64 = 20;

    async fn fetch_window(
        &self,
        session: &dyn HttpSession,
        window_start: NaiveDate,
        end: NaiveDate,
        log: &CycleLog,
    ) -> Result<AvailabilityMap> {
        let url = self.site.endpoint.as_str();

        log.log("Starting POST request to retrieve availability grid");
        let response = session
            .post_json(url, &self.search_body(window_start, end))
            .await?
            .ensure_ok(url)?;

        parse_grid_response(&response.body, log)
    }
}

#[derive(Debug, Deserialize)]
struct GridResponse {
    #[serde(rename = "Facility")]
    facility: Option<Facility>,
}

#[derive(Debug, Deserialize)]
struct Facility {
    #[serde(rename = "Units")]
    units: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct Unit {
    #[serde(rename = "ShortName")]
    short_name: Option<String>,
    #[serde(rename = "Slices")]
    slices: Option<BTreeMap<String, Slice>>,
}

#[derive(Debug, Deserialize)]
struct Slice {
    #[serde(rename = "Date")]
    date: Option<String>,
    #[serde(rename = "IsFree")]
    is_free: Option<bool>,
}

/// Parse a grid search response. A malformed unit is logged and skipped
/// without affecting its siblings.
pub fn parse_grid_response(body: &str, log: &CycleLog) -> Result<AvailabilityMap> {
    let response: GridResponse = serde_json::from_str(body)?;
    let units = response
        .facility
        .ok_or_else(|| ScanError::Parse("Response has no Facility".to_string()))?
        .units
        .ok_or_else(|| ScanError::Parse("Facility has no Units".to_string()))?;

    log.log(format!("Processing {} units", units.len()));
    let mut availability = AvailabilityMap::new();

    for (unit_id, raw) in units {
        match unit_dates(raw) {
            Ok((name, dates)) => {
                log.log(format!("Unit {}: {} free dates", name, dates.len()));
                availability.extend_site(&name, dates);
            }
            Err(reason) => log.log(format!("Skipping unit {}: {}", unit_id, reason)),
        }
    }

    Ok(availability)
}

/// Name and free dates of one unit, or why the unit is unusable
fn unit_dates(raw: Value) -> std::result::Result<(String, Vec<NaiveDate>), String> {
    let unit: Unit = serde_json::from_value(raw).map_err(|e| e.to_string())?;
    let name = unit.short_name.ok_or("missing ShortName")?;
    let slices = unit.slices.ok_or("missing Slices")?;

    let mut dates = Vec::new();
    for (slice_id, slice) in slices {
        let (Some(date), Some(is_free)) = (slice.date, slice.is_free) else {
            return Err(format!("slice {} lacks Date or IsFree", slice_id));
        };
        if !is_free {
            continue;
        }
        let day = date.get(..10).unwrap_or(date.as_str());
        dates.push(DateFormat::Iso.parse(day).map_err(|e| e.to_string())?);
    }
    Ok((name, dates))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::parser::{AvailabilityParser, FuzzyDelay, PagedParser};
    use crate::session_manager::testing::{Recorded, script};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const RESPONSE: &str = r#"{
        "Facility": {
            "FacilityId": 766,
            "Units": {
                "101": {
                    "ShortName": "CB1",
                    "Slices": {
                        "2024-03-01": {"Date": "2024-03-01", "IsFree": true},
                        "2024-03-02": {"Date": "2024-03-02", "IsFree": false},
                        "2024-03-03": {"Date": "2024-03-03T00:00:00", "IsFree": true}
                    }
                },
                "102": {
                    "Slices": {
                        "2024-03-01": {"Date": "2024-03-01", "IsFree": true}
                    }
                },
                "103": {
                    "ShortName": "CB3"
                },
                "104": {
                    "ShortName": "CB4",
                    "Slices": {
                        "2024-03-01": {"IsFree": true}
                    }
                },
                "105": {
                    "ShortName": "E5",
                    "Slices": {
                        "2024-03-02": {"Date": "2024-03-02", "IsFree": true}
                    }
                }
            }
        }
    }"#;

    #[test]
    fn test_free_slices_become_dates() {
        let log = CycleLog::new("test");
        let map = parse_grid_response(RESPONSE, &log).unwrap();

        assert_eq!(
            map.dates("CB1").unwrap().iter().copied().collect::<Vec<_>>(),
            vec![date(2024, 3, 1), date(2024, 3, 3)]
        );
        assert!(map.dates("E5").unwrap().contains(&date(2024, 3, 2)));
    }

    #[test]
    fn test_malformed_units_are_skipped() {
        let log = CycleLog::new("test");
        let map = parse_grid_response(RESPONSE, &log).unwrap();

        assert_eq!(map.len(), 2);
        assert!(map.dates("CB3").is_none());
        assert!(map.dates("CB4").is_none());
        let skipped = log
            .buffer()
            .iter()
            .filter(|line| line.starts_with("Skipping unit"))
            .count();
        assert_eq!(skipped, 3);
    }

    #[test]
    fn test_missing_facility_or_units_is_parse_error() {
        let log = CycleLog::new("test");

        let err = parse_grid_response(r#"{"Message": "busy"}"#, &log).unwrap_err();
        assert_eq!(err.kind(), "parse");

        let err = parse_grid_response(r#"{"Facility": {"FacilityId": 1}}"#, &log).unwrap_err();
        assert!(err.to_string().contains("Units"));

        let err = parse_grid_response("<html>", &log).unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[tokio::test]
    async fn test_posts_search_body_per_window() {
        let sessions = script(vec![(200, RESPONSE), (200, RESPONSE)]);
        let parser = PagedParser::new(
            GridApiFetcher::new(GridApiSite::new("766")),
            Arc::new(sessions),
            FuzzyDelay::none(),
        );
        let log = CycleLog::new("test");

        parser
            .parse_availability(date(2024, 3, 1), date(2024, 3, 25), &log)
            .await
            .unwrap();

        let recorded = sessions.recorded();
        assert_eq!(recorded.len(), 2);
        match &recorded[1] {
            Recorded::PostJson(url, body) => {
                assert!(url.ends_with("/search/grid"));
                assert_eq!(body["FacilityId"], "766");
                assert_eq!(body["StartDate"], "2024-03-21");
                assert_eq!(body["MinDate"], "2024-03-21");
                assert_eq!(body["MaxDate"], "2024-03-25");
                assert_eq!(body["WebOnly"], true);
            }
            other => panic!("expected JSON POST, got {:?}", other),
        }
    }
}
