//! Campsite descriptors and the platform each one is scraped from.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::aspnet_parser::AspNetGridFetcher;
use crate::date_format::DateFormat;
use crate::grid_api_parser::GridApiFetcher;
use crate::parser::{AvailabilityParser, FuzzyDelay, PagedParser};
use crate::scan_types::{Result, ScanError};
use crate::session_manager::SessionFactory;
use crate::table_parser::TableCalendarFetcher;

/// Campground configuration as declared in the registry
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CampsiteDescriptor {
    /// Display name
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    /// Pattern the site names must match from their start, e.g. `CB.*` for cabins
    #[validate(length(min = 1, message = "site_filter is required"))]
    pub site_filter: String,

    /// Platform specific fields
    #[serde(flatten)]
    pub platform: Platform,
}

/// The reservation platform behind a campsite
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "platform", rename_all = "snake_case")]
pub enum Platform {
    /// HTML calendar table, GET then POST on one URL
    TableCalendar(TableCalendarSite),
    /// ASP.NET availability grid behind a view-state handshake
    AspNetGrid(AspNetGridSite),
    /// JSON grid search API
    GridApi(GridApiSite),
}

/// Fields for table calendar campsites
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TableCalendarSite {
    /// Page that serves and accepts the calendar form
    #[validate(url(message = "request_url must be a URL"))]
    pub request_url: String,

    /// Per-campsite overrides of the base form template
    #[validate(custom(function = "validate_table_form_params"))]
    pub form_params: BTreeMap<String, String>,
}

const TABLE_BASE_FORM_PARAMS: &[(&str, &str)] = &[
    ("contractCode", "CA"),
    ("parkId", "120063"),
    ("siteTypeFilter", "ALL"),
    ("availStatus", ""),
    ("submitSiteForm", "true"),
    ("search", "site"),
    ("lengthOfStay", "1"),
    ("campingDateFlex", "2w"),
    ("currentMaximumWindow", "12"),
    ("defaultMaximumWindow", "12"),
    ("loop", ""),
    ("siteCode", ""),
    ("lookingFor", ""),
    ("camping_2001_3013", ""),
    ("camping_2001_218", ""),
    ("camping_2002_3013", ""),
    ("camping_2002_218", ""),
    ("camping_2003_3012", ""),
    ("camping_3100_3012", ""),
    ("camping_10001_3012", ""),
    ("camping_10001_218", ""),
    ("camping_3101_3012", ""),
    ("camping_3101_218", ""),
    ("camping_9002_3012", ""),
    ("camping_9002_3013", ""),
    ("camping_9002_218", ""),
    ("camping_9001_3012", ""),
    ("camping_9001_218", ""),
    ("camping_3001_3013", ""),
    ("camping_2004_3013", ""),
    ("camping_2004_3012", ""),
    ("camping_3102_3012", ""),
];

fn validate_table_form_params(
    params: &BTreeMap<String, String>,
) -> std::result::Result<(), ValidationError> {
    for key in ["contractCode", "parkId"] {
        if params.get(key).is_none_or(|value| value.is_empty()) {
            return Err(ValidationError::new("missing_form_param")
                .with_message(format!("form_params must set {}", key).into()));
        }
    }
    Ok(())
}

impl TableCalendarSite {
    /// Build a site from overrides layered on the base form template
    pub fn new(request_url: impl Into<String>, overrides: &[(&str, &str)]) -> Self {
        Self {
            request_url: request_url.into(),
            form_params: overrides
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Full POST body for the window starting at `camping_date`
    pub fn post_params(&self, camping_date: NaiveDate) -> Vec<(String, String)> {
        let mut merged: BTreeMap<String, String> = TABLE_BASE_FORM_PARAMS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        merged.extend(self.form_params.clone());
        merged.insert(
            "campingDate".to_string(),
            DateFormat::Display.format(camping_date),
        );
        merged.into_iter().collect()
    }
}

/// Fields for ASP.NET grid campsites
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AspNetGridSite {
    /// Park identifier
    #[validate(length(min = 1, message = "place_id is required"))]
    pub place_id: String,

    /// Park name as the search box expects it
    #[validate(length(min = 1, message = "place_name is required"))]
    pub place_name: String,

    /// Facility identifier within the park
    #[validate(length(min = 1, message = "facility_id is required"))]
    pub facility_id: String,

    /// Facility type code
    #[validate(length(min = 1, message = "facility_type is required"))]
    pub facility_type: String,

    /// Endpoints of the handshake
    #[serde(default)]
    #[validate(nested)]
    pub endpoints: AspNetEndpoints,
}

/// The three pages of the ASP.NET handshake
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AspNetEndpoints {
    /// Landing page carrying the first tokens
    #[validate(url)]
    pub root_url: String,

    /// Search postback that primes the facility context
    #[validate(url)]
    pub home_url: String,

    /// Page returning the availability grid
    #[validate(url)]
    pub search_url: String,
}

impl Default for AspNetEndpoints {
    fn default() -> Self {
        Self {
            root_url: "https://www.reservecalifornia.com".to_string(),
            home_url: "https://www.reservecalifornia.com/CaliforniaWebHome/".to_string(),
            search_url: "https://www.reservecalifornia.com/CaliforniaWebHome/Facilities/SearchViewUnitAvailabity.aspx".to_string(),
        }
    }
}

/// Fields for JSON grid API campsites
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GridApiSite {
    /// Search endpoint
    #[serde(default = "default_grid_api_endpoint")]
    #[validate(url)]
    pub endpoint: String,

    /// Facility identifier
    #[validate(length(min = 1, message = "facility_id is required"))]
    pub facility_id: String,
}

fn default_grid_api_endpoint() -> String {
    "https://calirdr.usedirect.com/rdr/rdr/search/grid".to_string()
}

impl GridApiSite {
    /// Site on the default endpoint
    pub fn new(facility_id: impl Into<String>) -> Self {
        Self {
            endpoint: default_grid_api_endpoint(),
            facility_id: facility_id.into(),
        }
    }
}

impl Platform {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Platform::TableCalendar(_) => "table_calendar",
            Platform::AspNetGrid(_) => "asp_net_grid",
            Platform::GridApi(_) => "grid_api",
        }
    }

    fn validate_fields(&self) -> std::result::Result<(), validator::ValidationErrors> {
        match self {
            Platform::TableCalendar(site) => site.validate(),
            Platform::AspNetGrid(site) => site.validate(),
            Platform::GridApi(site) => site.validate(),
        }
    }

    /// Build the parser for this platform
    pub fn build_parser(
        &self,
        sessions: Arc<dyn SessionFactory>,
        delay: FuzzyDelay,
    ) -> Result<Box<dyn AvailabilityParser>> {
        let parser: Box<dyn AvailabilityParser> = match self {
            Platform::TableCalendar(site) => Box::new(PagedParser::new(
                TableCalendarFetcher::new(site.clone())?,
                sessions,
                delay,
            )),
            Platform::AspNetGrid(site) => Box::new(PagedParser::new(
                AspNetGridFetcher::new(site.clone())?,
                sessions,
                delay,
            )),
            Platform::GridApi(site) => Box::new(PagedParser::new(
                GridApiFetcher::new(site.clone()),
                sessions,
                delay,
            )),
        };
        Ok(parser)
    }
}

/// Compiled site-name filter
#[derive(Debug, Clone)]
pub struct SiteFilter {
    pattern: Regex,
}

impl SiteFilter {
    /// Compile a pattern, anchored at the start of the site name
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(&format!("^(?:{})", pattern)).map_err(|e| {
            ScanError::Validation(format!("Invalid site filter '{}': {}", pattern, e))
        })?;
        Ok(Self { pattern })
    }

    /// Whether the subscriber cares about this site
    pub fn matches(&self, site: &str) -> bool {
        self.pattern.is_match(site)
    }
}

/// A descriptor that passed validation
#[derive(Debug, Clone)]
pub struct Campsite {
    /// Display name
    pub name: String,
    /// Compiled site filter
    pub site_filter: SiteFilter,
    /// Platform specific fields
    pub platform: Platform,
}

impl TryFrom<CampsiteDescriptor> for Campsite {
    type Error = ScanError;

    fn try_from(descriptor: CampsiteDescriptor) -> Result<Self> {
        let label = if descriptor.name.is_empty() {
            "<unnamed>".to_string()
        } else {
            descriptor.name.clone()
        };

        descriptor
            .validate()
            .and_then(|_| descriptor.platform.validate_fields())
            .map_err(|e| ScanError::Validation(format!("Campsite {}: {}", label, e)))?;

        Ok(Self {
            site_filter: SiteFilter::new(&descriptor.site_filter)?,
            name: descriptor.name,
            platform: descriptor.platform,
        })
    }
}
