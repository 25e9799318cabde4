//! Calendar-day filtering of location records.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use tracing::debug;

use crate::{error::RecordError, model::LocationRecord};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Calendar day of `timestamp` as seen in `tz`.
///
/// Timestamps carrying an offset are converted into `tz` first; timestamps
/// without one are taken as wall time in `tz`. Returns `None` for anything
/// that is not ISO-8601 shaped.
pub fn calendar_day<Tz: TimeZone>(timestamp: &str, tz: &Tz) -> Option<NaiveDate> {
    let ts = timestamp.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(tz).date_naive());
    }

    for fmt in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(ts, fmt) {
            return Some(dt.with_timezone(tz).date_naive());
        }
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(ts, fmt) {
            return Some(ndt.date());
        }
    }

    NaiveDate::parse_from_str(ts, "%Y-%m-%d").ok()
}

/// Calendar day of `record` in `tz`, or the offending timestamp.
pub fn record_day<Tz: TimeZone>(
    record: &LocationRecord,
    tz: &Tz,
) -> Result<NaiveDate, RecordError> {
    calendar_day(&record.timestamp, tz)
        .ok_or_else(|| RecordError::InvalidTimestamp(record.timestamp.clone()))
}

/// Records whose timestamp falls on `day` in `tz`, in their original order.
///
/// Records with an unparseable timestamp never match.
pub fn records_on_day<'a, Tz: TimeZone>(
    records: &'a [LocationRecord],
    day: NaiveDate,
    tz: &Tz,
) -> Vec<&'a LocationRecord> {
    records
        .iter()
        .filter(|r| match record_day(r, tz) {
            Ok(d) => d == day,
            Err(e) => {
                debug!(user = %r.username, "ignoring record: {e}");
                false
            }
        })
        .collect()
}
