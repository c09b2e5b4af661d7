//! UTC datetime values with millisecond precision.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::util::datetime::{
    format_iso_millis, parse_iso_millis, DateTimeParseError, MAX_FORMATTABLE_MILLIS,
    MIN_FORMATTABLE_MILLIS,
};

/// A UTC datetime stored as signed milliseconds since the Unix epoch.
///
/// The full i64 range is representable on the wire; only the portion
/// covering calendar years 1 through 9999 can be rendered as an ISO 8601
/// string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateTime(i64);

impl DateTime {
    /// Creates a datetime from milliseconds since the epoch.
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns milliseconds since the epoch.
    pub fn millis(&self) -> i64 {
        self.0
    }

    /// Returns the current time, truncated to milliseconds.
    pub fn now() -> Self {
        let millis = match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_millis() as i64,
            Err(e) => -(e.duration().as_millis() as i64),
        };
        Self(millis)
    }

    /// Returns true if the instant falls within calendar years 1..=9999.
    pub fn is_formattable(&self) -> bool {
        (MIN_FORMATTABLE_MILLIS..=MAX_FORMATTABLE_MILLIS).contains(&self.0)
    }

    /// Formats as `YYYY-MM-DDTHH:MM:SS[.fff]Z`, or `None` outside the
    /// formattable range.
    pub fn to_iso_string(&self) -> Option<String> {
        if self.is_formattable() {
            Some(format_iso_millis(self.0))
        } else {
            None
        }
    }

    /// Parses an ISO 8601 date or datetime string.
    pub fn parse_iso(input: &str) -> Result<Self, DateTimeParseError> {
        parse_iso_millis(input).map(Self)
    }
}

impl std::fmt::Display for DateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_iso_string() {
            Some(s) => f.write_str(&s),
            None => write!(f, "{}ms", self.0),
        }
    }
}
