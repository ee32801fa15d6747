//! ASP.NET availability grid. Three requests per window, each postback
//! echoing the view-state the previous page handed out; the last page has a
//! `td` per site and day whose title says whether it can be booked.

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use scraper::Html;

use crate::aspnet_forms::{ViewState, availability_form, home_search_form};
use crate::campsite::AspNetGridSite;
use crate::cycle_log::CycleLog;
use crate::date_format::DateFormat;
use crate::parser::{WindowFetcher, selector};
use crate::scan_types::{AvailabilityMap, Result, ScanError};
use crate::session_manager::HttpSession;

const NOT_AVAILABLE_PATTERN: &str = r"^(\w+).*(\d{2}/\d{2}/\d{4}).*is not available$";
const AVAILABLE_PATTERN: &str = r"^(\w+).*is available on.*(\d{2}/\d{2}/\d{4})$";

/// What a grid cell's title says
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellTitle {
    /// Site can be booked on the date
    Available {
        /// Site name
        site: String,
        /// Night in question
        date: NaiveDate,
    },
    /// Site is taken on the date
    NotAvailable {
        /// Site name
        site: String,
        /// Night in question
        date: NaiveDate,
    },
    /// Title matched neither sentence
    Unrecognized,
}

/// Sorts grid cell titles into available and not available
#[derive(Debug, Clone)]
pub struct TitleClassifier {
    not_available: Regex,
    available: Regex,
}

impl TitleClassifier {
    /// Compile both title patterns
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| ScanError::Validation(format!("Invalid title pattern: {}", e)))
        };
        Ok(Self {
            not_available: compile(NOT_AVAILABLE_PATTERN)?,
            available: compile(AVAILABLE_PATTERN)?,
        })
    }

    /// Classify one title. The "not available" sentence is checked first.
    pub fn classify(&self, title: &str) -> CellTitle {
        if let Some((site, date)) = Self::site_and_date(&self.not_available, title) {
            return CellTitle::NotAvailable { site, date };
        }
        if let Some((site, date)) = Self::site_and_date(&self.available, title) {
            return CellTitle::Available { site, date };
        }
        CellTitle::Unrecognized
    }

    fn site_and_date(pattern: &Regex, title: &str) -> Option<(String, NaiveDate)> {
        let captures = pattern.captures(title)?;
        let site = captures.get(1)?.as_str().trim().to_string();
        let date = DateFormat::Slash.parse(captures.get(2)?.as_str().trim()).ok()?;
        Some((site, date))
    }
}

/// Fetches one window through the ASP.NET handshake
pub struct AspNetGridFetcher {
    site: AspNetGridSite,
    classifier: TitleClassifier,
}

impl AspNetGridFetcher {
    /// Create a fetcher for a site
    pub fn new(site: AspNetGridSite) -> Result<Self> {
        Ok(Self {
            site,
            classifier: TitleClassifier::new()?,
        })
    }
}

#[async_trait]
impl WindowFetcher for AspNetGridFetcher {
    const PLATFORM: &'static str = "asp_net_grid";
    const STRIDE_DAYS: u64 = 21;

    async fn fetch_window(
        &self,
        session: &dyn HttpSession,
        window_start: NaiveDate,
        _end: NaiveDate,
        log: &CycleLog,
    ) -> Result<AvailabilityMap> {
        let endpoints = &self.site.endpoints;

        log.log("Starting GET request to setup session cookies etc.");
        let landing = session
            .get(&endpoints.root_url)
            .await?
            .ensure_ok(&endpoints.root_url)?;
        let state = extract_view_state(&landing.body, log)?;

        log.log("Starting first POST request to set up context for specific park");
        let home = session
            .post_form(
                &endpoints.home_url,
                &home_search_form(&self.site, &state, window_start),
            )
            .await?
            .ensure_ok(&endpoints.home_url)?;
        let state = extract_view_state(&home.body, log)?;

        log.log("Starting final POST request to retrieve availability data");
        let grid = session
            .post_form(
                &endpoints.search_url,
                &availability_form(&self.site, &state, window_start),
            )
            .await?
            .ensure_ok(&endpoints.search_url)?;

        parse_grid(&grid.body, &self.classifier, log)
    }
}

/// Read the two hidden view-state fields out of a page
pub fn extract_view_state(html: &str, log: &CycleLog) -> Result<ViewState> {
    let document = Html::parse_document(html);

    let field = |id: &str| -> Result<String> {
        log.log(format!("Getting {} ...", id));
        let element = document
            .select(&selector(&format!(r#"[id="{}"]"#, id))?)
            .next()
            .ok_or_else(|| ScanError::Parse(format!("No {} found", id)))?;
        element
            .value()
            .attr("value")
            .map(str::to_string)
            .ok_or_else(|| ScanError::Parse(format!("{} has no value", id)))
    };

    Ok(ViewState {
        view_state: field("__VIEWSTATE")?,
        generator: field("__VIEWSTATEGENERATOR")?,
    })
}

/// Collect the available (site, date) pairs from a grid page. Cells
/// without a recognizable title are logged and skipped.
pub fn parse_grid(
    html: &str,
    classifier: &TitleClassifier,
    log: &CycleLog,
) -> Result<AvailabilityMap> {
    let document = Html::parse_document(html);
    let cells: Vec<_> = document.select(&selector("td")?).collect();

    log.log(format!("Processing {} cells", cells.len()));
    let mut availability = AvailabilityMap::new();

    for cell in cells {
        let Some(title) = cell.value().attr("title").filter(|t| !t.is_empty()) else {
            log.log("Found invalid cell because no title found on cell ...");
            continue;
        };

        match classifier.classify(title) {
            CellTitle::Available { site, date } => {
                log.log(format!("Site: {}, date: {}, is_available: true", site, date));
                availability.add(site, date);
            }
            CellTitle::NotAvailable { site, date } => {
                log.log(format!("Site: {}, date: {}, is_available: false", site, date));
            }
            CellTitle::Unrecognized => {
                log.log(format!(
                    "Found invalid cell because title \"{}\" did not match regex ...",
                    title
                ));
            }
        }
    }

    Ok(availability)
}
