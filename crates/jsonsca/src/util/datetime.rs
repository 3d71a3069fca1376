//! ISO-8601 formatting and parsing for millisecond instants.
//!
//! Dates travel on the wire as epoch milliseconds; this module only exists
//! to give them a readable form (`1984-04-12T00:00:00.000Z`) and to build
//! them from one.

const MILLISECONDS_PER_SECOND: i64 = 1000;
const MILLISECONDS_PER_MINUTE: i64 = 60 * MILLISECONDS_PER_SECOND;
const MILLISECONDS_PER_HOUR: i64 = 60 * MILLISECONDS_PER_MINUTE;
const MILLISECONDS_PER_DAY: i64 = 24 * MILLISECONDS_PER_HOUR;

/// Error type for ISO-8601 parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeParseError {
    pub message: String,
}

impl DateTimeParseError {
    fn invalid(input: &str) -> Self {
        Self {
            message: format!("Invalid ISO-8601 datetime: {}", input),
        }
    }
}

impl std::fmt::Display for DateTimeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DateTimeParseError {}

/// Returns true if the given year is a leap year.
fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// Returns the number of days in a given month (1-indexed).
fn days_in_month(year: i64, month: u32) -> u32 {
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

/// Calculates days since Unix epoch for a given date (Howard Hinnant).
fn date_to_days(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let m = if month <= 2 { month as i64 + 9 } else { month as i64 - 3 };

    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let doy = (153 * m + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;

    era * 146097 + doe - 719468
}

/// Converts days since Unix epoch to (year, month, day).
fn days_to_date(days: i64) -> (i64, u32, u32) {
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = z - era * 146097;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;

    let year = if m <= 2 { y + 1 } else { y };
    (year, m, d)
}

/// Formats epoch milliseconds as `YYYY-MM-DDTHH:MM:SS.sssZ`.
///
/// Years outside 0..=9999 use the six-digit signed form (`+275760-...`).
pub fn format_iso8601(epoch_ms: i64) -> String {
    let days = epoch_ms.div_euclid(MILLISECONDS_PER_DAY);
    let ms_of_day = epoch_ms.rem_euclid(MILLISECONDS_PER_DAY);
    let (year, month, day) = days_to_date(days);

    let hours = ms_of_day / MILLISECONDS_PER_HOUR;
    let minutes = (ms_of_day % MILLISECONDS_PER_HOUR) / MILLISECONDS_PER_MINUTE;
    let seconds = (ms_of_day % MILLISECONDS_PER_MINUTE) / MILLISECONDS_PER_SECOND;
    let millis = ms_of_day % MILLISECONDS_PER_SECOND;

    let year_str = if (0..=9999).contains(&year) {
        format!("{:04}", year)
    } else if year < 0 {
        format!("-{:06}", -year)
    } else {
        format!("+{:06}", year)
    };

    format!(
        "{}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        year_str, month, day, hours, minutes, seconds, millis
    )
}

/// Parses a timezone suffix (`Z`, `+HH:MM`, `-HH:MM`) into offset milliseconds.
fn parse_offset(offset: &str, input: &str) -> Result<i64, DateTimeParseError> {
    if offset == "Z" || offset == "z" {
        return Ok(0);
    }
    let bytes = offset.as_bytes();
    if bytes.len() != 6 || bytes[3] != b':' {
        return Err(DateTimeParseError::invalid(input));
    }
    let sign = match bytes[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return Err(DateTimeParseError::invalid(input)),
    };
    let hours = parse_digits(&offset[1..3], input)?;
    let minutes = parse_digits(&offset[4..6], input)?;
    if hours > 23 || minutes > 59 {
        return Err(DateTimeParseError::invalid(input));
    }
    Ok(sign * (hours * MILLISECONDS_PER_HOUR + minutes * MILLISECONDS_PER_MINUTE))
}

fn parse_digits(s: &str, input: &str) -> Result<i64, DateTimeParseError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DateTimeParseError::invalid(input));
    }
    s.parse().map_err(|_| DateTimeParseError::invalid(input))
}

/// Parses `YYYY-MM-DDTHH:MM:SS[.fff](Z|±HH:MM)` into epoch milliseconds.
///
/// Fractional seconds beyond millisecond precision are truncated.
pub fn parse_iso8601(input: &str) -> Result<i64, DateTimeParseError> {
    let invalid = || DateTimeParseError::invalid(input);
    if !input.is_ascii() {
        return Err(invalid());
    }

    let (year, rest) = match input.as_bytes().first() {
        Some(b'+') | Some(b'-') if input.len() > 7 => {
            let year = parse_digits(&input[1..7], input)?;
            let year = if input.starts_with('-') { -year } else { year };
            (year, &input[7..])
        }
        _ if input.len() > 4 => (parse_digits(&input[..4], input)?, &input[4..]),
        _ => return Err(invalid()),
    };

    // rest: -MM-DDTHH:MM:SS...
    let b = rest.as_bytes();
    if b.len() < 15
        || b[0] != b'-'
        || b[3] != b'-'
        || !matches!(b[6], b'T' | b't')
        || b[9] != b':'
        || b[12] != b':'
    {
        return Err(invalid());
    }
    let month = parse_digits(&rest[1..3], input)? as u32;
    let day = parse_digits(&rest[4..6], input)? as u32;
    let hours = parse_digits(&rest[7..9], input)?;
    let minutes = parse_digits(&rest[10..12], input)?;
    let seconds = parse_digits(&rest[13..15], input)?;

    if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
        return Err(invalid());
    }
    if hours > 23 || minutes > 59 || seconds > 59 {
        return Err(invalid());
    }

    let mut tail = &rest[15..];
    let mut millis = 0;
    if let Some(frac) = tail.strip_prefix('.') {
        let digits = frac.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(invalid());
        }
        let mut padded = frac[..digits].to_string();
        padded.truncate(3);
        while padded.len() < 3 {
            padded.push('0');
        }
        millis = parse_digits(&padded, input)?;
        tail = &frac[digits..];
    }
    let offset = parse_offset(tail, input)?;

    let days = date_to_days(year, month, day);
    Ok(days * MILLISECONDS_PER_DAY
        + hours * MILLISECONDS_PER_HOUR
        + minutes * MILLISECONDS_PER_MINUTE
        + seconds * MILLISECONDS_PER_SECOND
        + millis
        - offset)
}
