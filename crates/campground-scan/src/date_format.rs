//! Canonical date strings used in requests, responses and messages.

use chrono::NaiveDate;

use crate::scan_types::{Result, ScanError};

/// The date formats the reservation platforms speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `Wed Jan 14 2015`. Table calendar POST bodies and every human-facing message.
    Display,
    /// `01/14/2015`. ASP.NET grid form fields and cell titles.
    Slash,
    /// `2015-01-14`. JSON grid API.
    Iso,
}

impl DateFormat {
    /// strftime pattern for this format
    pub fn pattern(self) -> &'static str {
        match self {
            DateFormat::Display => "%a %b %d %Y",
            DateFormat::Slash => "%m/%d/%Y",
            DateFormat::Iso => "%Y-%m-%d",
        }
    }

    /// Render a date. Careful: the `Display` output is also posted as `campingDate`.
    pub fn format(self, date: NaiveDate) -> String {
        date.format(self.pattern()).to_string()
    }

    /// Parse a date, surrounding whitespace ignored.
    pub fn parse(self, text: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(text.trim(), self.pattern()).map_err(|e| {
            ScanError::Parse(format!(
                "Date '{}' does not match '{}': {}",
                text,
                self.pattern(),
                e
            ))
        })
    }
}

/// Shorthand for the display format.
pub fn format_date(date: NaiveDate) -> String {
    DateFormat::Display.format(date)
}
