//! When to poll next: an hourly-ish cadence with fuzz, and a nightly quiet
//! period during which nothing runs.

use std::time::Duration;

use chrono::{Days, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use rand::Rng;

/// Poll interval plus a uniform 10 to 100 second fuzz
pub fn periodic_wait(poll_interval: Duration) -> Duration {
    let fuzz = rand::rng().random_range(10.0..=100.0);
    poll_interval + Duration::from_secs_f64(fuzz)
}

/// Time left in the quiet period `[start_hour, end_hour)`, if `now` is in it.
///
/// A start hour later than the end hour wraps past midnight. Equal hours
/// mean there is no quiet period.
pub fn quiet_period_remaining(
    now: NaiveDateTime,
    start_hour: u32,
    end_hour: u32,
) -> Option<TimeDelta> {
    if start_hour == end_hour {
        return None;
    }

    let hour = now.hour();
    let today = now.date();
    let end_time = NaiveTime::from_hms_opt(end_hour, 0, 0)?;

    let ends_on = if start_hour < end_hour {
        (start_hour..end_hour).contains(&hour).then_some(today)?
    } else if hour >= start_hour {
        today.checked_add_days(Days::new(1))?
    } else if hour < end_hour {
        today
    } else {
        return None;
    };

    Some(ends_on.and_time(end_time) - now)
}
