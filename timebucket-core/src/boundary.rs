//! Named range boundaries relative to the start of a reference day.

use std::collections::HashSet;

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BucketError, BucketResult};

pub const TODAY: &str = "today";
pub const YESTERDAY: &str = "yesterday";
pub const THIS_WEEK: &str = "this_week";
pub const EARLIER: &str = "earlier";

/// Where a range starts, counted back from the start of the reference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cutoff {
    /// Midnight of the local date `n` calendar days before the reference date.
    DaysAgo(u32),
    /// No lower bound. Only valid on the oldest range.
    Unbounded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boundary {
    pub key: String,
    pub cutoff: Cutoff,
}

impl Boundary {
    pub fn days_ago(key: impl Into<String>, days: u32) -> Self {
        Boundary {
            key: key.into(),
            cutoff: Cutoff::DaysAgo(days),
        }
    }

    pub fn unbounded(key: impl Into<String>) -> Self {
        Boundary {
            key: key.into(),
            cutoff: Cutoff::Unbounded,
        }
    }
}

/// An ordered, validated list of boundaries, most recent first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundarySet {
    boundaries: Vec<Boundary>,
}

impl Default for BoundarySet {
    /// Today, Yesterday, a rolling 7-day window, then everything older.
    fn default() -> Self {
        BoundarySet {
            boundaries: vec![
                Boundary::days_ago(TODAY, 0),
                Boundary::days_ago(YESTERDAY, 1),
                Boundary::days_ago(THIS_WEEK, 7),
                Boundary::unbounded(EARLIER),
            ],
        }
    }
}

impl BoundarySet {
    /// Validate and build a boundary set.
    ///
    /// Rejects an empty list, empty or repeated keys, day offsets that do not
    /// strictly increase, and an unbounded range anywhere but last.
    pub fn new(boundaries: Vec<Boundary>) -> BucketResult<Self> {
        if boundaries.is_empty() {
            return Err(BucketError::EmptyBoundaries);
        }

        let mut seen = HashSet::new();
        let mut previous: Option<u32> = None;
        let last = boundaries.len() - 1;

        for (i, boundary) in boundaries.iter().enumerate() {
            if boundary.key.trim().is_empty() {
                return Err(BucketError::EmptyBoundaryKey);
            }
            if !seen.insert(boundary.key.as_str()) {
                return Err(BucketError::DuplicateBoundary(boundary.key.clone()));
            }

            match boundary.cutoff {
                Cutoff::Unbounded if i != last => {
                    return Err(BucketError::UnboundedNotLast(boundary.key.clone()));
                }
                Cutoff::Unbounded => {}
                Cutoff::DaysAgo(days) => {
                    match previous {
                        Some(prev) if days <= prev => {
                            return Err(BucketError::NonMonotonicBoundary {
                                key: boundary.key.clone(),
                                days,
                                previous: prev,
                            });
                        }
                        _ => previous = Some(days),
                    }
                }
            }
        }

        Ok(BoundarySet { boundaries })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Boundary> {
        self.boundaries.iter()
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.boundaries.iter().map(|b| b.key.as_str())
    }

    /// Compute concrete cutoff instants for a reference instant.
    ///
    /// Day offsets are calendar days in the reference's timezone, so a range
    /// spanning a DST change is 23 or 25 hours long, not 24.
    pub fn resolve<Tz: TimeZone>(&self, reference: &DateTime<Tz>) -> Vec<ResolvedBoundary> {
        let tz = reference.timezone();
        let today = reference.date_naive();

        let mut resolved: Vec<ResolvedBoundary> = Vec::with_capacity(self.boundaries.len());
        for boundary in &self.boundaries {
            let from = match boundary.cutoff {
                // Offsets past the calendar's range behave as unbounded.
                Cutoff::DaysAgo(days) => today
                    .checked_sub_days(Days::new(u64::from(days)))
                    .map(|date| local_midnight(date, &tz)),
                Cutoff::Unbounded => None,
            };
            let until = resolved.last().and_then(|prev| prev.from);
            resolved.push(ResolvedBoundary {
                key: boundary.key.clone(),
                from,
                until,
            });
        }
        resolved
    }
}

impl<'a> IntoIterator for &'a BoundarySet {
    type Item = &'a Boundary;
    type IntoIter = std::slice::Iter<'a, Boundary>;

    fn into_iter(self) -> Self::IntoIter {
        self.boundaries.iter()
    }
}

/// A boundary pinned to a reference instant, covering `[from, until)`.
///
/// `from: None` is unbounded in the past; `until: None` is unbounded in the
/// future (only the most recent range).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedBoundary {
    pub key: String,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl ResolvedBoundary {
    /// True when `at` is at or after this range's lower cutoff.
    pub fn reaches(&self, at: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| at >= from)
    }
}

/// Midnight at the start of the reference's local day, as an instant.
pub fn start_of_day<Tz: TimeZone>(reference: &DateTime<Tz>) -> DateTime<Utc> {
    local_midnight(reference.date_naive(), &reference.timezone())
}

/// The first instant of `date` in `tz`.
///
/// Ambiguous midnights take the earlier instant. Where midnight falls in a DST
/// gap, the day starts at the first local minute that exists.
pub fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);

    if let Some(dt) = tz.from_local_datetime(&midnight).earliest() {
        return dt.with_timezone(&Utc);
    }

    (1..=24 * 60)
        .map(|minutes| midnight + Duration::minutes(minutes))
        .find_map(|local| tz.from_local_datetime(&local).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}
