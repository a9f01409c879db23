use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

const SECONDS_PER_DAY: f64 = 24.0 * 3600.0;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Convert timestamp to human readable format
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Parse an ISO 8601 timestamp. A trailing `Z` is stripped and offset-less
/// values are read as UTC; a bare date means midnight.
pub fn parse_iso_timestamp(timestamp_str: &str) -> Option<DateTime<Utc>> {
    let trimmed = timestamp_str.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Convert Unix timestamp (seconds, fractional allowed) to DateTime<Utc>
pub fn from_unix_timestamp(timestamp: f64) -> Option<DateTime<Utc>> {
    if !timestamp.is_finite() {
        return None;
    }
    let secs = timestamp.floor();
    let nanos = ((timestamp - secs) * 1e9) as u32;
    if secs < i64::MIN as f64 || secs > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp(secs as i64, nanos)
}

/// Read a creation timestamp from an untyped field: ISO 8601 string or epoch
/// seconds (number or numeric string). Anything else, or an unparseable
/// value, yields `None`.
pub fn timestamp_from_value(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::String(s) => parse_iso_timestamp(s).or_else(|| {
            s.trim()
                .parse::<f64>()
                .ok()
                .and_then(from_unix_timestamp)
        }),
        Value::Number(n) => n.as_f64().and_then(from_unix_timestamp),
        _ => None,
    }
}

/// Fractional days from `created` to `now`; never negative.
pub fn age_in_days(created: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let seconds = (now - created).num_milliseconds() as f64 / 1000.0;
    (seconds / SECONDS_PER_DAY).max(0.0)
}
