//! Utility modules.

pub mod datetime;

pub use datetime::{
    format_iso_millis, parse_iso_millis, DateTimeParseError, MAX_FORMATTABLE_MILLIS,
    MIN_FORMATTABLE_MILLIS,
};
