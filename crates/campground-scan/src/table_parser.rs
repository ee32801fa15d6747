//! Calendar table platform: one GET to pick up session cookies, one POST of
//! the campsite's form for a two week window, then an HTML table with one
//! row per site and one status cell per day.

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use scraper::{ElementRef, Html};

use crate::campsite::TableCalendarSite;
use crate::cycle_log::CycleLog;
use crate::parser::{WindowFetcher, selector};
use crate::scan_types::{AvailabilityMap, Result, ScanError};
use crate::session_manager::HttpSession;

/// Minimum `td` count for a row to carry availability; shorter rows are layout.
const MIN_ROW_CELLS: usize = 3;

/// Fetches one window from a table calendar site
pub struct TableCalendarFetcher {
    site: TableCalendarSite,
}

impl TableCalendarFetcher {
    /// Create a fetcher for a site
    pub fn new(site: TableCalendarSite) -> Result<Self> {
        if site.request_url.is_empty() {
            return Err(ScanError::Validation("request_url is required".to_string()));
        }
        Ok(Self { site })
    }
}

#[async_trait]
impl WindowFetcher for TableCalendarFetcher {
    const PLATFORM: &'static str = "table_calendar";
    const STRIDE_DAYS: u64 = 14;

    async fn fetch_window(
        &self,
        session: &dyn HttpSession,
        window_start: NaiveDate,
        _end: NaiveDate,
        log: &CycleLog,
    ) -> Result<AvailabilityMap> {
        let url = self.site.request_url.as_str();

        log.log("Starting GET request to setup session cookies etc.");
        session.get(url).await?;

        log.log("Starting POST request to retrieve 2 week availability data");
        let response = session
            .post_form(url, &self.site.post_params(window_start))
            .await?
            .ensure_ok(url)?;

        parse_calendar(&response.body, window_start, log)
    }
}

/// Parse a calendar page whose first status column is `window_start`.
pub fn parse_calendar(
    html: &str,
    window_start: NaiveDate,
    log: &CycleLog,
) -> Result<AvailabilityMap> {
    let document = Html::parse_document(html);

    let table = document
        .select(&selector("table#calendar")?)
        .next()
        .ok_or_else(|| ScanError::Parse("Could not find table with id: calendar".to_string()))?;

    let rows: Vec<ElementRef> = table.select(&selector("tbody tr")?).collect();
    if rows.is_empty() {
        return Err(ScanError::Parse("Could not find any rows in table".to_string()));
    }

    let cell_sel = selector("td")?;
    let label_sel = selector(".siteListLabel")?;
    let anchor_sel = selector("a")?;
    let status_sel = selector("td.status")?;

    log.log(format!("Processing {} rows", rows.len()));
    let mut availability = AvailabilityMap::new();

    for row in rows {
        if row.select(&cell_sel).count() < MIN_ROW_CELLS {
            continue;
        }

        let site_name = site_name(&row, &label_sel, &anchor_sel)?;

        let status_cells: Vec<ElementRef> = row.select(&status_sel).collect();
        if status_cells.is_empty() {
            return Err(ScanError::Parse(format!(
                "No status cells found in row for site {}",
                site_name
            )));
        }

        let dates = available_dates(&status_cells, &anchor_sel, window_start);
        log.log(format!(
            "Site {}: {} available dates",
            site_name,
            dates.len()
        ));
        availability.extend_site(&site_name, dates);
    }

    Ok(availability)
}

fn site_name(
    row: &ElementRef,
    label_sel: &scraper::Selector,
    anchor_sel: &scraper::Selector,
) -> Result<String> {
    let label = row.select(label_sel).next().ok_or_else(|| {
        ScanError::Parse("Could not find any html tag with class=siteListLabel".to_string())
    })?;
    let anchor = label
        .select(anchor_sel)
        .next()
        .ok_or_else(|| ScanError::Parse("Could not find link inside siteListLabel".to_string()))?;

    let name = element_text(&anchor);
    if name.is_empty() {
        return Err(ScanError::Parse("Empty site name in siteListLabel".to_string()));
    }
    Ok(name)
}

/// Dates whose status cell reads `A`. Cell `i` is `window_start + i` days.
fn available_dates(
    status_cells: &[ElementRef],
    anchor_sel: &scraper::Selector,
    window_start: NaiveDate,
) -> Vec<NaiveDate> {
    status_cells
        .iter()
        .enumerate()
        .filter(|(_, cell)| {
            let text = match cell.select(anchor_sel).next() {
                Some(anchor) => element_text(&anchor),
                None => element_text(cell),
            };
            text == "A"
        })
        .filter_map(|(index, _)| window_start.checked_add_days(Days::new(index as u64)))
        .collect()
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::parser::{AvailabilityParser, FuzzyDelay, PagedParser};
    use crate::session_manager::testing::{Recorded, field, script};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn site_row(name: &str, statuses: &[&str]) -> String {
        let cells: String = statuses
            .iter()
            .map(|s| format!(r#"<td class="status"><a href="/book">{}</a></td>"#, s))
            .collect();
        format!(
            r#"<tr><td class="siteListLabel"><a href="/site">{}</a></td><td>loop</td>{}</tr>"#,
            name, cells
        )
    }

    fn calendar(rows: &[String]) -> String {
        format!(
            r#"<html><body><table id="calendar"><thead><tr><th>Site</th></tr></thead><tbody>{}</tbody></table></body></html>"#,
            rows.concat()
        )
    }

    #[test]
    fn test_available_cells_map_to_offsets() {
        let html = calendar(&[site_row("CB12", &["A", "R", " A ", "X", "A"])]);
        let log = CycleLog::new("test");

        let map = parse_calendar(&html, date(2024, 3, 1), &log).unwrap();

        let dates: Vec<_> = map.dates("CB12").unwrap().iter().copied().collect();
        assert_eq!(
            dates,
            vec![date(2024, 3, 1), date(2024, 3, 3), date(2024, 3, 5)]
        );
    }

    #[test]
    fn test_status_without_anchor_uses_cell_text() {
        let html = calendar(&[
            r#"<tr><td class="siteListLabel"><a>S1</a></td><td class="status">R</td><td class="status">A</td></tr>"#
                .to_string(),
        ]);
        let log = CycleLog::new("test");

        let map = parse_calendar(&html, date(2024, 3, 1), &log).unwrap();
        assert_eq!(
            map.dates("S1").unwrap().iter().copied().collect::<Vec<_>>(),
            vec![date(2024, 3, 2)]
        );
    }

    #[test]
    fn test_short_rows_are_skipped() {
        let layout = r#"<tr><td>spacer</td><td class="status">A</td></tr>"#.to_string();
        let html = calendar(&[layout, site_row("CB1", &["R", "A"])]);
        let log = CycleLog::new("test");

        let map = parse_calendar(&html, date(2024, 3, 1), &log).unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.dates("CB1").is_some());
    }

    #[test]
    fn test_row_with_exactly_three_cells_is_valid() {
        let row = r#"<tr><td class="siteListLabel"><a>S9</a></td><td>x</td><td class="status">A</td></tr>"#;
        let html = calendar(&[row.to_string()]);
        let log = CycleLog::new("test");

        let map = parse_calendar(&html, date(2024, 3, 1), &log).unwrap();
        assert_eq!(map.dates("S9").unwrap().len(), 1);
    }

    #[test]
    fn test_sites_without_availability_are_omitted() {
        let html = calendar(&[site_row("A3", &["R", "X"])]);
        let log = CycleLog::new("test");

        let map = parse_calendar(&html, date(2024, 3, 1), &log).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_missing_table_is_parse_error() {
        let log = CycleLog::new("test");
        let err = parse_calendar("<html><body><p>maintenance</p></body></html>", date(2024, 3, 1), &log)
            .unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn test_empty_table_is_parse_error() {
        let log = CycleLog::new("test");
        let err = parse_calendar(&calendar(&[]), date(2024, 3, 1), &log).unwrap_err();
        assert!(err.to_string().contains("rows"));
    }

    #[test]
    fn test_missing_site_label_is_parse_error() {
        let row = r#"<tr><td>no label</td><td>x</td><td class="status">A</td></tr>"#;
        let log = CycleLog::new("test");
        let err = parse_calendar(&calendar(&[row.to_string()]), date(2024, 3, 1), &log).unwrap_err();
        assert!(err.to_string().contains("siteListLabel"));
    }

    #[test]
    fn test_missing_status_cells_is_parse_error() {
        let row = r#"<tr><td class="siteListLabel"><a>S1</a></td><td>x</td><td>y</td></tr>"#;
        let log = CycleLog::new("test");
        let err = parse_calendar(&calendar(&[row.to_string()]), date(2024, 3, 1), &log).unwrap_err();
        assert!(err.to_string().contains("status cells"));
    }

    #[tokio::test]
    async fn test_get_then_post_with_camping_date() {
        let page = calendar(&[site_row("CB12", &["A"])]);
        let page: &'static str = Box::leak(page.into_boxed_str());
        let sessions = script(vec![(200, "<html></html>"), (200, page)]);
        let site = TableCalendarSite::new(
            "https://example.com/calendar",
            &[("contractCode", "EB"), ("parkId", "110458")],
        );
        let parser = PagedParser::new(
            TableCalendarFetcher::new(site).unwrap(),
            Arc::new(sessions),
            FuzzyDelay::none(),
        );
        let log = CycleLog::new("test");

        let map = parser
            .parse_availability(date(2015, 1, 14), date(2015, 1, 20), &log)
            .await
            .unwrap();
        assert_eq!(
            map.dates("CB12").unwrap().iter().copied().collect::<Vec<_>>(),
            vec![date(2015, 1, 14)]
        );

        let recorded = sessions.recorded();
        assert_eq!(
            recorded[0],
            Recorded::Get("https://example.com/calendar".to_string())
        );
        match &recorded[1] {
            Recorded::PostForm(url, params) => {
                assert_eq!(url, "https://example.com/calendar");
                assert_eq!(field(params, "campingDate"), Some("Wed Jan 14 2015"));
                assert_eq!(field(params, "parkId"), Some("110458"));
            }
            other => panic!("expected form POST, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_200_post_is_fetch_error() {
        let sessions = script(vec![(200, ""), (503, "busy")]);
        let site = TableCalendarSite::new(
            "https://example.com/calendar",
            &[("contractCode", "EB"), ("parkId", "1")],
        );
        let parser = PagedParser::new(
            TableCalendarFetcher::new(site).unwrap(),
            Arc::new(sessions),
            FuzzyDelay::none(),
        );
        let log = CycleLog::new("test");

        let err = parser
            .parse_availability(date(2015, 1, 14), date(2015, 1, 20), &log)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "fetch");
    }
}
