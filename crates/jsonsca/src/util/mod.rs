//! Utility modules for JSON/SCA.

pub mod datetime;

pub use datetime::{format_iso8601, parse_iso8601, DateTimeParseError};
