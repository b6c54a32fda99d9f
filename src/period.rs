//! The calendar month used to scope opening balances, transaction queries
//! and monthly summaries.
//!
//! Month values arrive from clients in several shapes (an English month
//! name, a numeric string, a plain number) and historical data may hold any
//! of them. This module normalizes all of them into a single [Period] value
//! at the boundary so the rest of the crate only ever sees a validated
//! month number.

use std::fmt::{self, Display};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize, de};
use time::{Date, Month};

use crate::Error;

/// English month names, indexed by month number minus one.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A calendar month, 1 through 12.
///
/// All month arithmetic in the application assumes the current calendar
/// year; a `Period` deliberately carries no year component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period(u8);

impl Period {
    /// Create a period from a month number.
    ///
    /// # Errors
    /// Returns [Error::InvalidPeriod] if `month` is not in 1..=12.
    pub fn new(month: u8) -> Result<Self, Error> {
        if (1..=12).contains(&month) {
            Ok(Self(month))
        } else {
            Err(Error::InvalidPeriod(month.to_string()))
        }
    }

    /// Parse a period from a month name such as "November" (any casing) or
    /// a numeric string such as "11".
    ///
    /// # Errors
    /// Returns [Error::InvalidPeriod] if `value` matches neither form.
    pub fn parse(value: &str) -> Result<Self, Error> {
        let trimmed = value.trim();

        for (index, name) in MONTH_NAMES.iter().enumerate() {
            if name.eq_ignore_ascii_case(trimmed) {
                return Ok(Self(index as u8 + 1));
            }
        }

        trimmed
            .parse::<u8>()
            .ok()
            .and_then(|month| Self::new(month).ok())
            .ok_or_else(|| Error::InvalidPeriod(value.to_owned()))
    }

    /// Parse a period, returning `None` instead of an error.
    ///
    /// Read paths use this so that malformed historical data degrades to
    /// "no opening balance recorded" rather than failing the whole view.
    pub fn parse_lenient(value: &str) -> Option<Self> {
        Self::parse(value).ok()
    }

    /// The month number, 1 through 12.
    pub fn as_number(self) -> u8 {
        self.0
    }

    /// The English name of the month, e.g. "November".
    pub fn name(self) -> &'static str {
        MONTH_NAMES[(self.0 - 1) as usize]
    }

    /// The month as a [time::Month].
    pub fn month(self) -> Month {
        Month::try_from(self.0).expect("a Period always holds a month in 1..=12")
    }

    /// The first day of this month in `year`.
    pub fn first_day(self, year: i32) -> Date {
        // Day one exists in every month.
        Date::from_calendar_date(year, self.month(), 1).unwrap()
    }

    /// The last day of this month in `year`.
    pub fn last_day(self, year: i32) -> Date {
        let month = self.month();

        Date::from_calendar_date(year, month, month.length(year)).unwrap()
    }
}

impl From<Date> for Period {
    fn from(date: Date) -> Self {
        Self(date.month() as u8)
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Period {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct PeriodVisitor;

        impl de::Visitor<'_> for PeriodVisitor {
            type Value = Period;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a month name or a month number from 1 to 12")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Period, E> {
                Period::parse(value).map_err(|error| E::custom(error.to_string()))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Period, E> {
                u8::try_from(value)
                    .ok()
                    .and_then(|month| Period::new(month).ok())
                    .ok_or_else(|| E::custom(format!("{value} is not a month number from 1 to 12")))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Period, E> {
                u64::try_from(value)
                    .map_err(|_| E::custom(format!("{value} is not a month number from 1 to 12")))
                    .and_then(|month| self.visit_u64(month))
            }
        }

        deserializer.deserialize_any(PeriodVisitor)
    }
}

impl ToSql for Period {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0 as i64))
    }
}

impl FromSql for Period {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_i64()?;

        u8::try_from(raw)
            .ok()
            .and_then(|month| Period::new(month).ok())
            .ok_or(FromSqlError::OutOfRange(raw))
    }
}


#[cfg(test)]
mod date_range_tests {
    use time::macros::date;

    use super::Period;

    #[test]
    fn first_and_last_day_cover_the_month() {
        let period = Period::parse("April").unwrap();

        assert_eq!(period.first_day(2025), date!(2025 - 04 - 01));
        assert_eq!(period.last_day(2025), date!(2025 - 04 - 30));
    }

    #[test]
    fn last_day_handles_leap_years() {
        let period = Period::parse("February").unwrap();

        assert_eq!(period.last_day(2024), date!(2024 - 02 - 29));
        assert_eq!(period.last_day(2025), date!(2025 - 02 - 28));
    }
}
