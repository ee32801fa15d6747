//! # Campground Scan
//!
//! This crate scrapes campground reservation platforms for available sites.
//! It holds the campsite descriptors, one parser per platform, and the
//! availability finder that decides when subscribers should hear about it.

/// Errors and the availability map shared by every parser
mod scan_types;
pub use scan_types::*;

/// Date formats spoken by the platforms
pub mod date_format;
pub use date_format::{DateFormat, format_date};

/// Per-cycle diagnostic buffer
pub mod cycle_log;
pub use cycle_log::CycleLog;

/// HTTP sessions with their own cookie jars
pub mod session_manager;
pub use session_manager::{
    HttpResponse, HttpSession, ReqwestSessionFactory, SessionConfig, SessionFactory,
};

/// Campsite descriptors and platform selection
pub mod campsite;
pub use campsite::{
    AspNetEndpoints, AspNetGridSite, Campsite, CampsiteDescriptor, GridApiSite, Platform,
    SiteFilter, TableCalendarSite,
};

/// Parser contract and window pagination
pub mod parser;
pub use parser::{AvailabilityParser, FuzzyDelay, PagedParser, WindowFetcher};

/// HTML calendar table platform
pub mod table_parser;

/// Form bodies for the ASP.NET postbacks
pub mod aspnet_forms;
/// ASP.NET grid platform
pub mod aspnet_parser;

/// JSON grid API platform
pub mod grid_api_parser;

/// Poll cycle and notification policy
pub mod finder;
pub use finder::{
    AvailabilityFinder, CycleOutcome, FinderConfig, FinderState, NotifyDecision, NotifyReason,
    Notifier, SkipReason,
};
