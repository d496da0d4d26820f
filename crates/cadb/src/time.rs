//! ASN.1 UTCTime / GeneralizedTime strings as used in index records.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

use crate::error::{Error, Result};

/// Parses `YYMMDDHHMMSSZ` (UTCTime) or `YYYYMMDDHHMMSSZ` (GeneralizedTime).
///
/// Two-digit years follow the X.509 convention: `50..=99` map to the 1900s,
/// `00..=49` to the 2000s.
///
/// # Errors
///
/// Returns [`Error::InvalidTimestamp`] if the string is not one of the two forms
/// or names an impossible date.
pub fn parse_asn1_time(s: &str) -> Result<DateTime<Utc>> {
    let invalid = || Error::InvalidTimestamp(s.to_string());

    let digits = s.strip_suffix('Z').ok_or_else(invalid)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let (year, rest) = match digits.len() {
        12 => {
            let yy = two_digits(&digits[..2]);
            let year = if yy >= 50 { 1900 + yy } else { 2000 + yy };
            (year, &digits[2..])
        }
        14 => (
            two_digits(&digits[..2]) * 100 + two_digits(&digits[2..4]),
            &digits[4..],
        ),
        _ => return Err(invalid()),
    };

    let month = two_digits(&rest[..2]);
    let day = two_digits(&rest[2..4]);
    let hour = two_digits(&rest[4..6]);
    let minute = two_digits(&rest[6..8]);
    let second = two_digits(&rest[8..10]);

    let naive = NaiveDate::from_ymd_opt(year as i32, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .ok_or_else(invalid)?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Formats a timestamp the way certificates encode validity dates: UTCTime
/// for years 1950 through 2049, GeneralizedTime otherwise.
#[must_use]
pub fn format_asn1_time(at: DateTime<Utc>) -> String {
    if (1950..2050).contains(&at.year()) {
        at.format("%y%m%d%H%M%SZ").to_string()
    } else {
        at.format("%Y%m%d%H%M%SZ").to_string()
    }
}

/// Parses a reference instant given on a command line: either an ASN.1 time
/// string or RFC 3339.
///
/// # Errors
///
/// Returns [`Error::InvalidTimestamp`] if neither form matches.
pub fn parse_reference_time(s: &str) -> Result<DateTime<Utc>> {
    parse_asn1_time(s).or_else(|_| {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| Error::InvalidTimestamp(s.to_string()))
    })
}

/// Decimal value of an all-digit string.
fn two_digits(s: &str) -> u32 {
    debug_assert!(s.bytes().all(|b| b.is_ascii_digit()));
    s.bytes().fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
}
