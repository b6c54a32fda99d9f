//! Resolves the server's canonical timezone to the local calendar date.
//!
//! The current month and year defaults for transaction queries and
//! summaries are taken from the server's local date, not UTC.

use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

/// Get today's date in the timezone named by `canonical_timezone`, e.g.
/// "Pacific/Auckland".
///
/// # Errors
/// Returns [Error::InvalidTimezone] if the timezone name is not a valid
/// canonical timezone string.
pub fn local_today(canonical_timezone: &str) -> Result<Date, Error> {
    let offset = get_local_offset(canonical_timezone)
        .ok_or_else(|| Error::InvalidTimezone(canonical_timezone.to_owned()))?;

    Ok(OffsetDateTime::now_utc().to_offset(offset).date())
}

fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}
