//! RFC 1123 dates as used by `Last-Modified`.

use crate::PolicyError;
use chrono::{DateTime, NaiveDateTime, Utc};

const DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Exact grammar check: `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn is_rfc1123(value: &str) -> bool {
    if value.len() != 29 || !value.is_ascii() {
        return false;
    }
    let b = value.as_bytes();
    DAYS.contains(&&value[0..3])
        && &value[3..5] == ", "
        && digits(&value[5..7])
        && b[7] == b' '
        && MONTHS.contains(&&value[8..11])
        && b[11] == b' '
        && digits(&value[12..16])
        && b[16] == b' '
        && digits(&value[17..19])
        && b[19] == b':'
        && digits(&value[20..22])
        && b[22] == b':'
        && digits(&value[23..25])
        && &value[25..] == " GMT"
}

fn digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// Parse an RFC 1123 date; the weekday must agree with the calendar date.
pub fn parse_http_date(value: &str) -> Result<DateTime<Utc>, PolicyError> {
    if !is_rfc1123(value) {
        return Err(PolicyError::InvalidDate(format!(
            "'{value}' does not match the RFC 1123 grammar"
        )));
    }
    NaiveDateTime::parse_from_str(value, "%a, %d %b %Y %H:%M:%S GMT")
        .map(|naive| naive.and_utc())
        .map_err(|e| PolicyError::InvalidDate(format!("'{value}': {e}")))
}

pub fn within_tolerance(date: DateTime<Utc>, reference: DateTime<Utc>, secs: i64) -> bool {
    (date - reference).num_seconds().abs() <= secs
}
