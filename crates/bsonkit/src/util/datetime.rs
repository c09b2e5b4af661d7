//! ISO 8601 parsing and formatting for millisecond timestamps.
//!
//! Converts between `YYYY-MM-DDTHH:MM:SS[.fff]Z` strings and signed
//! milliseconds since the Unix epoch, using integer civil-calendar math.

const MILLISECONDS_PER_SECOND: i64 = 1000;
const MILLISECONDS_PER_MINUTE: i64 = 60 * MILLISECONDS_PER_SECOND;
const MILLISECONDS_PER_HOUR: i64 = 60 * MILLISECONDS_PER_MINUTE;
const MILLISECONDS_PER_DAY: i64 = 24 * MILLISECONDS_PER_HOUR;

/// Millisecond timestamp of 0001-01-01T00:00:00Z, the earliest instant the
/// calendar formatter covers.
pub const MIN_FORMATTABLE_MILLIS: i64 = -62_135_596_800_000;

/// Millisecond timestamp of 9999-12-31T23:59:59.999Z, the latest instant the
/// calendar formatter covers.
pub const MAX_FORMATTABLE_MILLIS: i64 = 253_402_300_799_999;

/// Error type for ISO 8601 parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeParseError {
    pub message: String,
}

impl std::fmt::Display for DateTimeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DateTimeParseError {}

fn invalid(what: &str, input: &str) -> DateTimeParseError {
    DateTimeParseError {
        message: format!("Invalid {}: {}", what, input),
    }
}

/// Parses a timezone offset string (Z, +HH:MM, -HH:MM) and returns offset in minutes.
fn parse_timezone_offset(offset: &str) -> Result<i16, DateTimeParseError> {
    if offset == "Z" || offset == "z" {
        return Ok(0);
    }

    if offset.len() != 6 {
        return Err(invalid("timezone offset", offset));
    }

    let sign = match offset.chars().next() {
        Some('+') => 1i16,
        Some('-') => -1i16,
        _ => return Err(invalid("timezone offset", offset)),
    };

    if offset.chars().nth(3) != Some(':') {
        return Err(invalid("timezone offset", offset));
    }

    let hours: i16 = offset[1..3]
        .parse()
        .map_err(|_| invalid("timezone offset", offset))?;
    let minutes: i16 = offset[4..6]
        .parse()
        .map_err(|_| invalid("timezone offset", offset))?;

    if hours > 23 || minutes > 59 {
        return Err(invalid("timezone offset", offset));
    }

    Ok(sign * (hours * 60 + minutes))
}

/// Parses fractional-second digits and returns milliseconds, truncating
/// beyond three digits.
fn parse_fractional_millis(frac: &str) -> i64 {
    let mut padded = frac.to_string();
    while padded.len() < 3 {
        padded.push('0');
    }
    padded.truncate(3);
    padded.parse().unwrap_or(0)
}

/// Formats milliseconds-of-second as a fractional suffix, omitting if zero
/// and trimming trailing zeros.
fn format_fractional_millis(ms: i64) -> String {
    if ms == 0 {
        return String::new();
    }
    let str = format!("{:03}", ms);
    let trimmed = str.trim_end_matches('0');
    format!(".{}", trimmed)
}

/// Returns true if the given year is a leap year.
fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// Returns the number of days in a given month (1-indexed).
fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Calculates days since Unix epoch for a given date.
///
/// Howard Hinnant's days-from-civil algorithm.
fn date_to_days(year: i32, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year } as i64;
    let m = if month <= 2 {
        month as i64 + 9
    } else {
        month as i64 - 3
    };

    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u32; // year of era
    let doy = (153 * m as u32 + 2) / 5 + day - 1; // day of year
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // day of era

    era * 146097 + doe as i64 - 719468
}

/// Converts days since Unix epoch to (year, month, day).
fn days_to_date(days: i64) -> (i32, u32, u32) {
    // Howard Hinnant's algorithm in reverse
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u32; // day of era
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365; // year of era
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // day of year
    let mp = (5 * doy + 2) / 153; // month index
    let d = doy - (153 * mp + 2) / 5 + 1; // day
    let m = if mp < 10 { mp + 3 } else { mp - 9 }; // month

    let year = if m <= 2 { y + 1 } else { y } as i32;
    (year, m, d)
}

/// Formats milliseconds since the Unix epoch as `YYYY-MM-DDTHH:MM:SS[.fff]Z`.
///
/// Callers keep the input within
/// [`MIN_FORMATTABLE_MILLIS`]..=[`MAX_FORMATTABLE_MILLIS`]; outside that
/// range the year field no longer has four digits.
pub fn format_iso_millis(millis: i64) -> String {
    let days = millis.div_euclid(MILLISECONDS_PER_DAY);
    let time_ms = millis.rem_euclid(MILLISECONDS_PER_DAY);

    let (year, month, day) = days_to_date(days);

    let hours = time_ms / MILLISECONDS_PER_HOUR;
    let remaining = time_ms % MILLISECONDS_PER_HOUR;
    let minutes = remaining / MILLISECONDS_PER_MINUTE;
    let remaining = remaining % MILLISECONDS_PER_MINUTE;
    let seconds = remaining / MILLISECONDS_PER_SECOND;
    let frac = format_fractional_millis(remaining % MILLISECONDS_PER_SECOND);

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}{}Z",
        year, month, day, hours, minutes, seconds, frac
    )
}

/// Parses an ISO 8601 date or datetime string into milliseconds since the
/// Unix epoch.
///
/// Accepts `YYYY-MM-DD` (midnight UTC) and `YYYY-MM-DD[T ]HH:MM:SS` with
/// optional fractional seconds and optional `Z`/`+HH:MM`/`-HH:MM` offset;
/// a missing offset means UTC.
pub fn parse_iso_millis(input: &str) -> Result<i64, DateTimeParseError> {
    // All-ASCII keeps every byte-index slice below on a char boundary.
    if input.len() < 10 || !input.is_ascii() {
        return Err(invalid("ISO 8601 datetime", input));
    }

    let date_part = &input[..10];
    if date_part.chars().nth(4) != Some('-') || date_part.chars().nth(7) != Some('-') {
        return Err(invalid("ISO 8601 datetime", input));
    }

    let year: i32 = date_part[..4]
        .parse()
        .map_err(|_| invalid("year in datetime", input))?;
    let month: u32 = date_part[5..7]
        .parse()
        .map_err(|_| invalid("month in datetime", input))?;
    let day: u32 = date_part[8..10]
        .parse()
        .map_err(|_| invalid("day in datetime", input))?;

    if !(1..=12).contains(&month) {
        return Err(invalid("month in datetime", input));
    }
    if day < 1 || day > days_in_month(year, month) {
        return Err(invalid("day in datetime", input));
    }

    let days = date_to_days(year, month, day);

    if input.len() == 10 {
        return Ok(days * MILLISECONDS_PER_DAY);
    }

    let sep = input.chars().nth(10);
    if sep != Some('T') && sep != Some(' ') {
        return Err(invalid("ISO 8601 datetime", input));
    }

    let time_part = &input[11..];
    if time_part.len() < 8
        || time_part.chars().nth(2) != Some(':')
        || time_part.chars().nth(5) != Some(':')
    {
        return Err(invalid("ISO 8601 datetime", input));
    }

    let hours: i64 = time_part[..2]
        .parse()
        .map_err(|_| invalid("hours in datetime", input))?;
    let minutes: i64 = time_part[3..5]
        .parse()
        .map_err(|_| invalid("minutes in datetime", input))?;
    let seconds: i64 = time_part[6..8]
        .parse()
        .map_err(|_| invalid("seconds in datetime", input))?;

    if hours > 23 {
        return Err(invalid("hours in datetime", input));
    }
    if minutes > 59 {
        return Err(invalid("minutes in datetime", input));
    }
    if seconds > 59 {
        return Err(invalid("seconds in datetime", input));
    }

    // Optional fractional seconds, then optional timezone offset
    let rest = &time_part[8..];
    let (fractional, offset_str) = if let Some(frac_body) = rest.strip_prefix('.') {
        let frac_end = frac_body
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(frac_body.len());
        if frac_end == 0 {
            return Err(invalid("fractional seconds in datetime", input));
        }
        let tz = &frac_body[frac_end..];
        (
            &frac_body[..frac_end],
            if tz.is_empty() { None } else { Some(tz) },
        )
    } else if rest.is_empty() {
        ("", None)
    } else {
        ("", Some(rest))
    };

    let frac_ms = if fractional.is_empty() {
        0
    } else {
        parse_fractional_millis(fractional)
    };

    let offset_min = match offset_str {
        Some(s) => parse_timezone_offset(s)? as i64,
        None => 0,
    };

    let local_ms = days * MILLISECONDS_PER_DAY
        + hours * MILLISECONDS_PER_HOUR
        + minutes * MILLISECONDS_PER_MINUTE
        + seconds * MILLISECONDS_PER_SECOND
        + frac_ms;

    // Local time = UTC + offset, so UTC = local - offset
    Ok(local_ms - offset_min * MILLISECONDS_PER_MINUTE)
}
