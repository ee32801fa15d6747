//! Subject and body text for the two kinds of email.

use std::error::Error;
use std::fmt::Write;

use campground_scan::{AvailabilityMap, ScanError, format_date};
use chrono::NaiveDate;

/// Subject and body of an availability email.
///
/// The body lists one line per date, ascending, with the sites free that
/// night in name order.
pub fn availability_message(
    campsite: &str,
    start: NaiveDate,
    end: NaiveDate,
    availability: &AvailabilityMap,
) -> (String, String) {
    let subject = format!(
        "{} Availability {} to {}",
        campsite,
        format_date(start),
        format_date(end)
    );

    let mut body = format!("{}\n\n", subject);
    for (date, sites) in availability.by_date() {
        let _ = writeln!(body, "{}:  {}", format_date(date), sites.join("  "));
    }

    (subject, body)
}

/// Subject and body of a failure report, carrying the cycle log
pub fn failure_message(
    campsite: &str,
    start: NaiveDate,
    end: NaiveDate,
    error: &ScanError,
    log_lines: &[String],
) -> (String, String) {
    let subject = format!(
        "Scraper failed when searching between {} to {} for {}",
        format_date(start),
        format_date(end),
        campsite
    );

    let mut body = format!("Encountered error of type: {}\n", error.kind());
    let _ = writeln!(body, "{}", error);
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = writeln!(body, "  caused by: {}", cause);
        source = cause.source();
    }
    let _ = write!(body, "Log:\n{}", log_lines.join("\n"));

    (subject, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_availability_message_groups_by_date() {
        let availability: AvailabilityMap = [
            ("CB2", date(2015, 1, 15)),
            ("CB1", date(2015, 1, 15)),
            ("CB1", date(2015, 1, 14)),
        ]
        .into_iter()
        .collect();

        let (subject, body) = availability_message(
            "Steep Ravine",
            date(2015, 1, 13),
            date(2015, 7, 12),
            &availability,
        );

        assert_eq!(
            subject,
            "Steep Ravine Availability Tue Jan 13 2015 to Sun Jul 12 2015"
        );
        assert_eq!(
            body,
            "Steep Ravine Availability Tue Jan 13 2015 to Sun Jul 12 2015\n\n\
             Wed Jan 14 2015:  CB1\n\
             Thu Jan 15 2015:  CB1  CB2\n"
        );
    }

    #[test]
    fn test_failure_message_carries_kind_and_log() {
        let error = ScanError::Parse("Could not find table with id: calendar".to_string());
        let log = vec!["Starting search".to_string(), "Parsing response".to_string()];

        let (subject, body) = failure_message(
            "Redwood Regional Park",
            date(2015, 1, 13),
            date(2015, 7, 12),
            &error,
            &log,
        );

        assert_eq!(
            subject,
            "Scraper failed when searching between Tue Jan 13 2015 to Sun Jul 12 2015 for Redwood Regional Park"
        );
        assert!(body.starts_with("Encountered error of type: parse\n"));
        assert!(body.contains("Could not find table with id: calendar"));
        assert!(body.ends_with("Log:\nStarting search\nParsing response"));
    }
}
