//! RFC 3339 timestamp parsing and formatting.
//!
//! Timestamps travel through documents as RFC 3339 strings. In memory they are
//! held as seconds and nanoseconds since the Unix epoch together with the way
//! the string spelled its fraction and offset, so formatting reproduces the
//! text that was read.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;
const NANOS_PER_MICRO: i64 = 1_000;
const MICROS_PER_SECOND: i64 = 1_000_000;

/// Most fractional digits a timestamp can carry.
pub const MAX_FRACTION_DIGITS: usize = 9;

/// Error returned when a string is not an RFC 3339 datetime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid RFC 3339 timestamp {input:?}: {reason}")]
pub struct TimestampParseError {
    pub input: String,
    pub reason: &'static str,
}

impl TimestampParseError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// How the UTC offset was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OffsetStyle {
    /// `Z`.
    #[default]
    Zulu,
    /// `+HH:MM` or `-HH:MM`.
    Numeric,
    /// `-00:00`: UTC with the local offset unknown.
    UnknownLocal,
    /// No offset at all, read as UTC.
    Absent,
}

/// A point in time with the UTC offset it was recorded in.
///
/// Two timestamps naming the same instant with different offsets are not
/// equal: the offset, its spelling and the fraction width are part of the
/// attribute value and survive a decode/encode cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Timestamp {
    epoch_secs: i64,
    nanos: u32,
    fraction_digits: u8,
    offset_minutes: i16,
    offset_style: OffsetStyle,
}

impl Timestamp {
    /// 1970-01-01T00:00:00Z.
    pub const UNIX_EPOCH: Timestamp = Timestamp {
        epoch_secs: 0,
        nanos: 0,
        fraction_digits: 0,
        offset_minutes: 0,
        offset_style: OffsetStyle::Zulu,
    };

    /// Whole seconds since the Unix epoch (UTC).
    pub fn epoch_secs(&self) -> i64 {
        self.epoch_secs
    }

    /// Nanoseconds past [`epoch_secs`](Self::epoch_secs).
    pub fn nanos(&self) -> u32 {
        self.nanos
    }

    /// Microseconds since the Unix epoch (UTC), truncating nanoseconds.
    pub fn epoch_micros(&self) -> i64 {
        self.epoch_secs
            .saturating_mul(MICROS_PER_SECOND)
            .saturating_add(self.nanos as i64 / NANOS_PER_MICRO)
    }

    /// UTC offset in minutes.
    pub fn offset_minutes(&self) -> i16 {
        self.offset_minutes
    }

    pub fn offset_style(&self) -> OffsetStyle {
        self.offset_style
    }

    /// Number of fractional second digits the timestamp is written with.
    pub fn fraction_digits(&self) -> usize {
        self.fraction_digits as usize
    }

    /// True when both name the same instant, whatever their spelling.
    pub fn same_instant(&self, other: &Timestamp) -> bool {
        self.epoch_secs == other.epoch_secs && self.nanos == other.nanos
    }

    /// Parses an RFC 3339 datetime (`YYYY-MM-DDTHH:MM:SS[.fffffffff](Z|±HH:MM)`).
    ///
    /// A missing offset is read as UTC. Up to nine fractional digits are
    /// accepted; more cannot be represented and are rejected.
    pub fn parse(input: &str) -> Result<Self, TimestampParseError> {
        // Byte slicing below relies on ASCII input.
        if !input.is_ascii() {
            return Err(TimestampParseError::new(input, "non-ASCII character"));
        }
        if input.len() < 19 {
            return Err(TimestampParseError::new(input, "too short"));
        }

        let bytes = input.as_bytes();
        if bytes[10] != b'T' && bytes[10] != b't' && bytes[10] != b' ' {
            return Err(TimestampParseError::new(input, "missing date/time separator"));
        }
        if bytes[4] != b'-' || bytes[7] != b'-' {
            return Err(TimestampParseError::new(input, "malformed date"));
        }
        if bytes[13] != b':' || bytes[16] != b':' {
            return Err(TimestampParseError::new(input, "malformed time"));
        }

        let year = parse_digits(input, &input[..4], "invalid year")? as i32;
        let month = parse_digits(input, &input[5..7], "invalid month")? as u32;
        let day = parse_digits(input, &input[8..10], "invalid day")? as u32;
        if !(1..=12).contains(&month) {
            return Err(TimestampParseError::new(input, "month out of range"));
        }
        if day < 1 || day > days_in_month(year, month) {
            return Err(TimestampParseError::new(input, "day out of range"));
        }

        let hours = parse_digits(input, &input[11..13], "invalid hours")?;
        let minutes = parse_digits(input, &input[14..16], "invalid minutes")?;
        let seconds = parse_digits(input, &input[17..19], "invalid seconds")?;
        if hours > 23 {
            return Err(TimestampParseError::new(input, "hours out of range"));
        }
        if minutes > 59 {
            return Err(TimestampParseError::new(input, "minutes out of range"));
        }
        if seconds > 59 {
            return Err(TimestampParseError::new(input, "seconds out of range"));
        }

        let rest = &input[19..];
        let (fraction, offset) = match rest.strip_prefix('.') {
            Some(after_dot) => {
                let end = after_dot
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(after_dot.len());
                if end == 0 {
                    return Err(TimestampParseError::new(input, "empty fractional seconds"));
                }
                (&after_dot[..end], &after_dot[end..])
            }
            None => ("", rest),
        };
        if fraction.len() > MAX_FRACTION_DIGITS {
            return Err(TimestampParseError::new(
                input,
                "fractional seconds finer than nanoseconds",
            ));
        }

        let (offset_minutes, offset_style) = if offset.is_empty() {
            (0, OffsetStyle::Absent)
        } else {
            parse_offset(input, offset)?
        };

        let days = date_to_days(year, month, day);
        let local_secs = days * SECONDS_PER_DAY
            + hours * SECONDS_PER_HOUR
            + minutes * SECONDS_PER_MINUTE
            + seconds;

        // local = UTC + offset
        let epoch_secs = local_secs - offset_minutes as i64 * SECONDS_PER_MINUTE;

        Ok(Self {
            epoch_secs,
            nanos: parse_fraction(fraction),
            fraction_digits: fraction.len() as u8,
            offset_minutes,
            offset_style,
        })
    }

    /// Formats the timestamp as RFC 3339 in its recorded offset.
    ///
    /// The fraction is written with the digit count it was parsed with, and
    /// the offset with its original spelling.
    pub fn to_rfc3339(&self) -> String {
        let local = self
            .epoch_secs
            .saturating_add(self.offset_minutes as i64 * SECONDS_PER_MINUTE);

        let days = local.div_euclid(SECONDS_PER_DAY);
        let time_secs = local.rem_euclid(SECONDS_PER_DAY);
        let (year, month, day) = days_to_date(days);

        let hours = time_secs / SECONDS_PER_HOUR;
        let minutes = (time_secs % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
        let seconds = time_secs % SECONDS_PER_MINUTE;

        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}{}{}",
            year,
            month,
            day,
            hours,
            minutes,
            seconds,
            format_fraction(self.nanos, self.fraction_digits()),
            format_offset(self.offset_minutes, self.offset_style)
        )
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl FromStr for Timestamp {
    type Err = TimestampParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timestamp::parse(s)
    }
}

fn parse_digits(input: &str, digits: &str, reason: &'static str) -> Result<i64, TimestampParseError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimestampParseError::new(input, reason));
    }
    digits
        .parse()
        .map_err(|_| TimestampParseError::new(input, reason))
}

/// Parses `Z`, `+HH:MM` or `-HH:MM` into minutes east of UTC.
fn parse_offset(input: &str, offset: &str) -> Result<(i16, OffsetStyle), TimestampParseError> {
    if offset == "Z" || offset == "z" {
        return Ok((0, OffsetStyle::Zulu));
    }

    let bytes = offset.as_bytes();
    if bytes.len() != 6 || bytes[3] != b':' {
        return Err(TimestampParseError::new(input, "malformed offset"));
    }
    let sign: i16 = match bytes[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return Err(TimestampParseError::new(input, "malformed offset")),
    };

    let hours = parse_digits(input, &offset[1..3], "malformed offset")? as i16;
    let minutes = parse_digits(input, &offset[4..6], "malformed offset")? as i16;
    if hours > 23 || minutes > 59 {
        return Err(TimestampParseError::new(input, "offset out of range"));
    }

    let offset_minutes = sign * (hours * 60 + minutes);
    let style = if offset_minutes == 0 && sign < 0 {
        OffsetStyle::UnknownLocal
    } else {
        OffsetStyle::Numeric
    };
    Ok((offset_minutes, style))
}

fn format_offset(offset_minutes: i16, style: OffsetStyle) -> String {
    match style {
        OffsetStyle::Zulu => "Z".to_string(),
        OffsetStyle::Absent => String::new(),
        OffsetStyle::UnknownLocal => "-00:00".to_string(),
        OffsetStyle::Numeric => {
            let sign = if offset_minutes < 0 { '-' } else { '+' };
            let abs = offset_minutes.unsigned_abs();
            format!("{}{:02}:{:02}", sign, abs / 60, abs % 60)
        }
    }
}

/// Pads fractional digits to nanoseconds.
fn parse_fraction(fraction: &str) -> u32 {
    fraction
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(MAX_FRACTION_DIGITS)
        .fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
}

fn format_fraction(nanos: u32, digits: usize) -> String {
    if digits == 0 {
        return String::new();
    }
    let padded = format!("{:09}", nanos);
    format!(".{}", &padded[..digits.min(MAX_FRACTION_DIGITS)])
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Days since the Unix epoch (Howard Hinnant's `days_from_civil`).
fn date_to_days(year: i32, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year as i64 - 1 } else { year as i64 };
    let m = month as i64;
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (m + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Inverse of [`date_to_days`].
fn days_to_date(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_epoch() {
        let ts = Timestamp::parse("1970-01-01T00:00:00Z").unwrap();
        assert_eq!(ts, Timestamp::UNIX_EPOCH);
    }

    #[test]
    fn test_parse_basic() {
        let ts = Timestamp::parse("2024-03-15T14:30:00Z").unwrap();
        assert_eq!(ts.epoch_micros(), 1_710_513_000_000_000);
        assert_eq!(ts.offset_minutes(), 0);

        let ts = Timestamp::parse("2024-03-15T14:30:00.123456Z").unwrap();
        assert_eq!(ts.epoch_micros(), 1_710_513_000_123_456);
    }

    #[test]
    fn test_missing_offset_is_utc() {
        let with = Timestamp::parse("2024-03-15T14:30:00Z").unwrap();
        let without = Timestamp::parse("2024-03-15T14:30:00").unwrap();
        assert!(with.same_instant(&without));
        assert_eq!(without.offset_style(), OffsetStyle::Absent);
        assert_eq!(without.to_rfc3339(), "2024-03-15T14:30:00");
    }

    #[test]
    fn test_offset_preserved() {
        let ts = Timestamp::parse("2024-03-15T14:30:00+05:30").unwrap();
        assert_eq!(ts.offset_minutes(), 330);

        let utc = Timestamp::parse("2024-03-15T09:00:00Z").unwrap();
        assert_eq!(ts.epoch_micros(), utc.epoch_micros());
        assert_ne!(ts, utc);

        assert_eq!(ts.to_rfc3339(), "2024-03-15T14:30:00+05:30");
    }

    #[test]
    fn test_format_roundtrip() {
        let inputs = [
            "1970-01-01T00:00:00Z",
            "2016-02-29T23:59:59.5Z",
            "2024-03-15T14:30:00.123456Z",
            "2024-12-31T23:59:59.999999-08:00",
            "1969-12-31T23:59:59Z",
            "2024-01-15T10:30:00.500Z",
            "2024-01-15T10:30:00+00:00",
            "2024-01-15T10:30:00-00:00",
            "2024-01-15T10:30:00.123456789Z",
            "2024-01-15T10:30:00.000+01:00",
        ];
        for input in inputs {
            let ts: Timestamp = input.parse().unwrap();
            assert_eq!(ts.to_string(), input, "roundtrip failed for {}", input);
        }
    }

    #[test]
    fn test_negative_epoch() {
        let ts = Timestamp::parse("1969-12-31T23:59:59Z").unwrap();
        assert_eq!(ts.epoch_micros(), -1_000_000);

        let ts = Timestamp::parse("1969-12-31T23:59:59.75Z").unwrap();
        assert_eq!(ts.epoch_secs(), -1);
        assert_eq!(ts.nanos(), 750_000_000);
        assert_eq!(ts.epoch_micros(), -250_000);
    }

    #[test]
    fn test_nanosecond_precision() {
        let ts = Timestamp::parse("2024-03-15T14:30:00.123456789Z").unwrap();
        assert_eq!(ts.nanos(), 123_456_789);
        assert_eq!(ts.fraction_digits(), 9);
        assert_eq!(ts.epoch_micros(), 1_710_513_000_123_456);

        let err = Timestamp::parse("2024-03-15T14:30:00.1234567891Z").unwrap_err();
        assert_eq!(err.reason, "fractional seconds finer than nanoseconds");
    }

    #[test]
    fn test_spelling_is_part_of_value() {
        let zulu = Timestamp::parse("2024-01-15T10:30:00.5Z").unwrap();
        let padded = Timestamp::parse("2024-01-15T10:30:00.500Z").unwrap();
        let numeric = Timestamp::parse("2024-01-15T10:30:00.5+00:00").unwrap();

        assert!(zulu.same_instant(&padded));
        assert!(zulu.same_instant(&numeric));
        assert_ne!(zulu, padded);
        assert_ne!(zulu, numeric);
        assert_eq!(numeric.offset_style(), OffsetStyle::Numeric);
        assert_eq!(padded.fraction_digits(), 3);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(Timestamp::parse("2024-13-01T00:00:00Z").is_err());
        assert!(Timestamp::parse("2023-02-29T00:00:00Z").is_err());
        assert!(Timestamp::parse("2024-03-15T24:00:00Z").is_err());
        assert!(Timestamp::parse("2024-03-15T14:60:00Z").is_err());
        assert!(Timestamp::parse("2024-03-15T14:30:00+25:00").is_err());
        assert!(Timestamp::parse("2024-03-15T14:30:00.Z").is_err());
        assert!(Timestamp::parse("2024-03-15").is_err());
        assert!(Timestamp::parse("not a timestamp at all").is_err());
        assert!(Timestamp::parse("2024-03-15T14:30:0\u{e9}Z").is_err());
    }

    #[test]
    fn test_error_message() {
        let err = Timestamp::parse("yesterday").unwrap_err();
        assert_eq!(err.to_string(), "invalid RFC 3339 timestamp \"yesterday\": too short");
    }
}
