//! Parsing of record timestamps and timezone names.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::boundary::local_midnight;
use crate::error::{BucketError, BucketResult};

/// Naive date-time layouts, tried in order. `%.f` also matches no fraction.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Integers at or above this magnitude are epoch milliseconds, below it seconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Parse a timestamp into an instant.
///
/// Accepted forms:
/// - RFC 3339 with an offset (`2024-06-10T08:00:00Z`)
/// - naive date-time or bare date, read as local time in `tz`
/// - integer epoch, in milliseconds or seconds
///
/// Local times in a DST fold resolve to the earlier instant; local times in
/// a DST gap are rejected.
pub fn parse_timestamp(input: &str, tz: &Tz) -> BucketResult<DateTime<Utc>> {
    let s = input.trim();
    if s.is_empty() {
        return Err(BucketError::invalid_timestamp(input, "empty timestamp"));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if is_integer(s) {
        return parse_epoch(s);
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return from_local(naive, tz, input);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(local_midnight(date, tz));
    }

    Err(BucketError::invalid_timestamp(
        input,
        "expected RFC 3339, YYYY-MM-DD[THH:MM[:SS]] or an epoch number",
    ))
}

/// Parse an IANA timezone name such as `Europe/Berlin`.
pub fn parse_timezone(name: &str) -> BucketResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| BucketError::UnknownTimezone(name.to_string()))
}

fn is_integer(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn parse_epoch(s: &str) -> BucketResult<DateTime<Utc>> {
    let value: i64 = s
        .parse()
        .map_err(|_| BucketError::invalid_timestamp(s, "epoch value out of range"))?;

    let parsed = if value.unsigned_abs() >= EPOCH_MILLIS_THRESHOLD.unsigned_abs() {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    };

    parsed.ok_or_else(|| BucketError::invalid_timestamp(s, "epoch value out of range"))
}

fn from_local(naive: NaiveDateTime, tz: &Tz, input: &str) -> BucketResult<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            BucketError::invalid_timestamp(input, format!("local time does not exist in {}", tz))
        })
}
