//! Grouping of timestamped records into relative date ranges.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::boundary::{Boundary, BoundarySet, start_of_day};
use crate::error::BucketResult;
use crate::item::Timestamped;

/// One non-empty range of the output, most recent item first.
///
/// Items are references into the caller's collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket<'a, T> {
    pub key: String,
    pub items: Vec<&'a T>,
}

/// What to do with a record whose timestamp cannot be read.
///
/// Parsing is case-insensitive, from config files and the command line alike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum MalformedPolicy {
    /// Leave the record out and report it in [`Grouping::skipped`].
    #[default]
    Skip,
    /// Put the record at the end of the oldest range.
    Earliest,
}

impl fmt::Display for MalformedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedPolicy::Skip => write!(f, "skip"),
            MalformedPolicy::Earliest => write!(f, "earliest"),
        }
    }
}

impl FromStr for MalformedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(MalformedPolicy::Skip),
            "earliest" => Ok(MalformedPolicy::Earliest),
            other => Err(format!(
                "Unknown malformed-timestamp policy '{}'. Expected 'skip' or 'earliest'",
                other
            )),
        }
    }
}

impl TryFrom<String> for MalformedPolicy {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A record left out of the grouping, with its position in the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Skipped<'a, T> {
    pub index: usize,
    pub item: &'a T,
    pub reason: String,
}

/// Result of grouping records whose timestamps may be malformed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grouping<'a, T> {
    pub buckets: Vec<Bucket<'a, T>>,
    pub skipped: Vec<Skipped<'a, T>>,
}

impl<T> Grouping<'_, T> {
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty() && self.skipped.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.buckets.iter().map(|b| b.items.len()).sum()
    }
}

/// Partitions records into the ranges of a [`BoundarySet`].
#[derive(Debug, Clone, Default)]
pub struct TimeBucketer {
    boundaries: BoundarySet,
}

impl TimeBucketer {
    pub fn new(boundaries: BoundarySet) -> Self {
        TimeBucketer { boundaries }
    }

    pub fn boundaries(&self) -> &BoundarySet {
        &self.boundaries
    }

    /// Group `items` relative to `reference`.
    ///
    /// Buckets come out in boundary order and empty ones are dropped. Within a
    /// bucket items are newest first; items with equal timestamps keep their
    /// input order. `items` itself is left untouched.
    pub fn group<'a, T, Tz>(&self, items: &'a [T], reference: &DateTime<Tz>) -> Vec<Bucket<'a, T>>
    where
        T: Timestamped,
        Tz: TimeZone,
    {
        let stamped = items.iter().map(|item| (item.instant(), item)).collect();
        self.assign(stamped, Vec::new(), reference)
    }

    /// Group `items` whose timestamps are read by a fallible `extract`.
    ///
    /// Records that fail to parse are handled according to `policy` and logged.
    pub fn group_fallible<'a, T, Tz, F>(
        &self,
        items: &'a [T],
        reference: &DateTime<Tz>,
        policy: MalformedPolicy,
        extract: F,
    ) -> Grouping<'a, T>
    where
        Tz: TimeZone,
        F: Fn(&T) -> BucketResult<DateTime<Utc>>,
    {
        let mut stamped = Vec::with_capacity(items.len());
        let mut oldest = Vec::new();
        let mut skipped = Vec::new();

        for (index, item) in items.iter().enumerate() {
            match extract(item) {
                Ok(at) => stamped.push((at, item)),
                Err(err) => {
                    warn!(
                        "event=timestamp_invalid module=bucketer index={} policy={} error={}",
                        index, policy, err
                    );
                    match policy {
                        MalformedPolicy::Skip => skipped.push(Skipped {
                            index,
                            item,
                            reason: err.to_string(),
                        }),
                        MalformedPolicy::Earliest => oldest.push(item),
                    }
                }
            }
        }

        let buckets = self.assign(stamped, oldest, reference);
        Grouping { buckets, skipped }
    }

    fn assign<'a, T, Tz>(
        &self,
        mut stamped: Vec<(DateTime<Utc>, &'a T)>,
        oldest: Vec<&'a T>,
        reference: &DateTime<Tz>,
    ) -> Vec<Bucket<'a, T>>
    where
        Tz: TimeZone,
    {
        let resolved = self.boundaries.resolve(reference);
        let total = stamped.len() + oldest.len();
        let last = resolved.len() - 1;

        // sort_by is stable, so equal instants keep their input order.
        stamped.sort_by(|a, b| b.0.cmp(&a.0));

        let mut slots: Vec<Vec<&'a T>> = vec![Vec::new(); resolved.len()];
        for (at, item) in stamped {
            let slot = resolved
                .iter()
                .position(|range| range.reaches(at))
                .unwrap_or(last);
            slots[slot].push(item);
        }
        slots[last].extend(oldest);

        let buckets: Vec<Bucket<'a, T>> = resolved
            .into_iter()
            .zip(slots)
            .filter(|(_, items)| !items.is_empty())
            .map(|(range, items)| Bucket {
                key: range.key,
                items,
            })
            .collect();

        debug_assert_eq!(
            buckets.iter().map(|b| b.items.len()).sum::<usize>(),
            total,
            "every item lands in exactly one bucket"
        );
        debug_assert!(
            {
                let mut declared = self.boundaries.keys();
                buckets.iter().all(|b| declared.any(|key| key == b.key))
            },
            "buckets follow boundary order"
        );

        debug!(
            "event=group module=bucketer status=ok day_start={} items={} buckets={}",
            start_of_day(reference).to_rfc3339(),
            total,
            buckets.len()
        );

        buckets
    }
}

/// Group `items` into `boundaries` relative to `reference`.
///
/// The boundary list is validated first; an invalid list is rejected before
/// any item is looked at.
pub fn group_by_date<'a, T, Tz>(
    items: &'a [T],
    reference: &DateTime<Tz>,
    boundaries: Vec<Boundary>,
) -> BucketResult<Vec<Bucket<'a, T>>>
where
    T: Timestamped,
    Tz: TimeZone,
{
    let boundaries = BoundarySet::new(boundaries)?;
    Ok(TimeBucketer::new(boundaries).group(items, reference))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{EARLIER, THIS_WEEK, TODAY, YESTERDAY};
    use crate::error::BucketError;
    use chrono_tz::Tz;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        name: &'static str,
        at: DateTime<Utc>,
    }

    impl Timestamped for Item {
        fn instant(&self) -> DateTime<Utc> {
            self.at
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn item(name: &'static str, at: DateTime<Utc>) -> Item {
        Item { name, at }
    }

    fn reference() -> DateTime<Utc> {
        utc(2024, 6, 10, 12, 0, 0)
    }

    fn shape<T>(buckets: &[Bucket<'_, T>], name: impl Fn(&T) -> &'static str) -> Vec<(String, Vec<&'static str>)> {
        buckets
            .iter()
            .map(|b| (b.key.clone(), b.items.iter().map(|i| name(*i)).collect()))
            .collect()
    }

    fn names(buckets: &[Bucket<'_, Item>]) -> Vec<(String, Vec<&'static str>)> {
        shape(buckets, |i| i.name)
    }

    #[test]
    fn test_reference_scenarios() {
        let cases = [
            (utc(2024, 6, 10, 8, 0, 0), TODAY),
            (utc(2024, 6, 9, 23, 0, 0), YESTERDAY),
            (utc(2024, 6, 5, 10, 0, 0), THIS_WEEK),
            (utc(2024, 5, 1, 10, 0, 0), EARLIER),
        ];

        for (at, expected) in cases {
            let items = [item("x", at)];
            let buckets = TimeBucketer::default().group(&items, &reference());
            assert_eq!(buckets.len(), 1);
            assert_eq!(buckets[0].key, expected, "item at {at}");
        }
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        let items: Vec<Item> = vec![];
        assert!(TimeBucketer::default().group(&items, &reference()).is_empty());
    }

    #[test]
    fn test_equal_timestamps_keep_input_order() {
        let at = utc(2024, 6, 10, 8, 0, 0);
        let items = [item("A", at), item("B", at)];
        let buckets = TimeBucketer::default().group(&items, &reference());

        assert_eq!(names(&buckets), vec![(TODAY.to_string(), vec!["A", "B"])]);
    }

    #[test]
    fn test_full_partition_in_boundary_order() {
        let items = [
            item("old", utc(2024, 1, 1, 0, 0, 0)),
            item("morning", utc(2024, 6, 10, 7, 0, 0)),
            item("monday", utc(2024, 6, 3, 0, 0, 0)),
            item("last-night", utc(2024, 6, 9, 22, 0, 0)),
            item("noon", utc(2024, 6, 10, 11, 59, 0)),
            item("sunday-eve", utc(2024, 6, 2, 23, 59, 59)),
            item("yesterday-start", utc(2024, 6, 9, 0, 0, 0)),
            item("just-before-yesterday", utc(2024, 6, 8, 23, 59, 59)),
        ];
        let buckets = TimeBucketer::default().group(&items, &reference());

        assert_eq!(
            names(&buckets),
            vec![
                (TODAY.to_string(), vec!["noon", "morning"]),
                (YESTERDAY.to_string(), vec!["last-night", "yesterday-start"]),
                (THIS_WEEK.to_string(), vec!["just-before-yesterday", "monday"]),
                (EARLIER.to_string(), vec!["sunday-eve", "old"]),
            ]
        );

        let total: usize = buckets.iter().map(|b| b.items.len()).sum();
        assert_eq!(total, items.len());
        for original in &items {
            let hits = buckets
                .iter()
                .flat_map(|b| &b.items)
                .filter(|i| std::ptr::eq(**i, original))
                .count();
            assert_eq!(hits, 1, "{} should appear exactly once", original.name);
        }
    }

    #[test]
    fn test_empty_buckets_are_omitted() {
        let items = [
            item("now", utc(2024, 6, 10, 9, 0, 0)),
            item("ancient", utc(2020, 1, 1, 0, 0, 0)),
        ];
        let buckets = TimeBucketer::default().group(&items, &reference());

        let keys: Vec<_> = buckets.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec![TODAY, EARLIER]);
    }

    #[test]
    fn test_future_items_land_in_first_bucket() {
        let items = [item("tomorrow", utc(2024, 6, 11, 9, 0, 0))];
        let buckets = TimeBucketer::default().group(&items, &reference());
        assert_eq!(buckets[0].key, TODAY);
    }

    #[test]
    fn test_grouping_is_deterministic() {
        let items = [
            item("a", utc(2024, 6, 10, 1, 0, 0)),
            item("b", utc(2024, 6, 7, 1, 0, 0)),
            item("c", utc(2024, 6, 10, 1, 0, 0)),
            item("d", utc(2023, 6, 7, 1, 0, 0)),
        ];
        let bucketer = TimeBucketer::default();

        assert_eq!(
            bucketer.group(&items, &reference()),
            bucketer.group(&items, &reference())
        );
    }

    #[test]
    fn test_caller_order_is_untouched() {
        let items = vec![
            item("older", utc(2024, 6, 1, 0, 0, 0)),
            item("newer", utc(2024, 6, 10, 0, 0, 0)),
        ];
        let before = items.clone();
        let _ = TimeBucketer::default().group(&items, &reference());
        assert_eq!(items, before);
    }

    #[test]
    fn test_reference_timezone_decides_the_day() {
        // 00:30 in Berlin is still the previous day in UTC.
        let reference = chrono_tz::Europe::Berlin
            .with_ymd_and_hms(2024, 6, 10, 0, 30, 0)
            .unwrap();
        let items = [
            item("after-midnight", utc(2024, 6, 9, 22, 15, 0)),
            item("before-midnight", utc(2024, 6, 9, 21, 0, 0)),
        ];
        let buckets = TimeBucketer::default().group(&items, &reference);

        assert_eq!(
            names(&buckets),
            vec![
                (TODAY.to_string(), vec!["after-midnight"]),
                (YESTERDAY.to_string(), vec!["before-midnight"]),
            ]
        );
    }

    #[test]
    fn test_yesterday_is_a_calendar_day_across_dst() {
        let reference = chrono_tz::America::New_York
            .with_ymd_and_hms(2024, 3, 11, 12, 0, 0)
            .unwrap();
        let items = [
            // 2024-03-10 00:00 EST
            item("yesterday-start", utc(2024, 3, 10, 5, 0, 0)),
            // 2024-03-09 23:30 EST
            item("day-before", utc(2024, 3, 10, 4, 30, 0)),
        ];
        let buckets = TimeBucketer::default().group(&items, &reference);

        assert_eq!(
            names(&buckets),
            vec![
                (YESTERDAY.to_string(), vec!["yesterday-start"]),
                (THIS_WEEK.to_string(), vec!["day-before"]),
            ]
        );
    }

    #[test]
    fn test_items_older_than_every_cutoff_go_to_last_range() {
        let boundaries = vec![Boundary::days_ago("recent", 0), Boundary::days_ago("older", 3)];
        let items = [
            item("today", utc(2024, 6, 10, 1, 0, 0)),
            item("way-back", utc(2023, 1, 1, 0, 0, 0)),
            item("two-days", utc(2024, 6, 8, 1, 0, 0)),
        ];
        let buckets = group_by_date(&items, &reference(), boundaries).unwrap();

        assert_eq!(
            names(&buckets),
            vec![
                ("recent".to_string(), vec!["today"]),
                ("older".to_string(), vec!["two-days", "way-back"]),
            ]
        );
    }

    #[test]
    fn test_group_by_date_rejects_bad_boundaries() {
        let items = [item("x", reference())];
        let err = group_by_date(
            &items,
            &reference(),
            vec![Boundary::days_ago("a", 3), Boundary::days_ago("b", 1)],
        )
        .unwrap_err();
        assert!(err.is_boundary_error());
    }

    #[test]
    fn test_datetimes_group_directly() {
        let items = [utc(2024, 6, 9, 8, 0, 0), utc(2024, 6, 10, 8, 0, 0)];
        let buckets = TimeBucketer::default().group(&items, &reference());

        assert_eq!(buckets[0].key, TODAY);
        assert_eq!(*buckets[0].items[0], items[1]);
        assert_eq!(buckets[1].key, YESTERDAY);
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Raw {
        name: &'static str,
        at: &'static str,
    }

    fn parse(raw: &Raw) -> BucketResult<DateTime<Utc>> {
        crate::timestamp::parse_timestamp(raw.at, &Tz::UTC)
    }

    fn raw_names(buckets: &[Bucket<'_, Raw>]) -> Vec<(String, Vec<&'static str>)> {
        shape(buckets, |r| r.name)
    }

    fn raw_items() -> Vec<Raw> {
        vec![
            Raw { name: "good-old", at: "2024-01-01T00:00:00Z" },
            Raw { name: "broken", at: "soon" },
            Raw { name: "good-new", at: "2024-06-10T09:00:00Z" },
            Raw { name: "blank", at: "" },
        ]
    }

    #[test]
    fn test_malformed_skip_reports_items() {
        let items = raw_items();
        let grouping = TimeBucketer::default().group_fallible(
            &items,
            &reference(),
            MalformedPolicy::Skip,
            parse,
        );

        assert_eq!(
            raw_names(&grouping.buckets),
            vec![
                (TODAY.to_string(), vec!["good-new"]),
                (EARLIER.to_string(), vec!["good-old"]),
            ]
        );
        let skipped: Vec<_> = grouping.skipped.iter().map(|s| (s.index, s.item.name)).collect();
        assert_eq!(skipped, vec![(1, "broken"), (3, "blank")]);
        assert!(grouping.skipped[0].reason.contains("soon"));
        assert_eq!(grouping.item_count(), 2);
    }

    #[test]
    fn test_malformed_earliest_fails_open() {
        let items = raw_items();
        let grouping = TimeBucketer::default().group_fallible(
            &items,
            &reference(),
            MalformedPolicy::Earliest,
            parse,
        );

        assert!(grouping.skipped.is_empty());
        assert_eq!(
            raw_names(&grouping.buckets),
            vec![
                (TODAY.to_string(), vec!["good-new"]),
                (EARLIER.to_string(), vec!["good-old", "broken", "blank"]),
            ]
        );
    }

    #[test]
    fn test_malformed_earliest_creates_oldest_bucket() {
        let items = vec![Raw { name: "broken", at: "??" }];
        let grouping = TimeBucketer::default().group_fallible(
            &items,
            &reference(),
            MalformedPolicy::Earliest,
            parse,
        );
        assert_eq!(raw_names(&grouping.buckets), vec![(EARLIER.to_string(), vec!["broken"])]);
    }

    #[test]
    fn test_epoch_out_of_range_is_skipped() {
        let items = vec![
            Raw { name: "good", at: "2024-06-10T09:00:00Z" },
            Raw { name: "i64-min", at: "-9223372036854775808" },
        ];
        let grouping = TimeBucketer::default().group_fallible(
            &items,
            &reference(),
            MalformedPolicy::Skip,
            parse,
        );

        assert_eq!(raw_names(&grouping.buckets), vec![(TODAY.to_string(), vec!["good"])]);
        let skipped: Vec<_> = grouping.skipped.iter().map(|s| (s.index, s.item.name)).collect();
        assert_eq!(skipped, vec![(1, "i64-min")]);
    }

    #[test]
    fn test_custom_boundaries_keep_declared_order() {
        let boundaries = vec![
            Boundary::days_ago("now", 0),
            Boundary::days_ago("fortnight", 14),
            Boundary::unbounded("archive"),
        ];
        let items = [
            item("archived", utc(2023, 1, 1, 0, 0, 0)),
            item("fresh", utc(2024, 6, 10, 6, 0, 0)),
        ];
        let buckets = group_by_date(&items, &reference(), boundaries).unwrap();

        let keys: Vec<_> = buckets.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["now", "archive"]);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("Skip".parse::<MalformedPolicy>().unwrap(), MalformedPolicy::Skip);
        assert_eq!("earliest".parse::<MalformedPolicy>().unwrap(), MalformedPolicy::Earliest);
        assert!("drop".parse::<MalformedPolicy>().is_err());
    }

    #[test]
    fn test_policy_deserializes_case_insensitively() {
        let policy: MalformedPolicy = serde_json::from_str(r#""Earliest""#).unwrap();
        assert_eq!(policy, MalformedPolicy::Earliest);
        assert!(serde_json::from_str::<MalformedPolicy>(r#""drop""#).is_err());
        assert_eq!(serde_json::to_string(&MalformedPolicy::Skip).unwrap(), r#""skip""#);
    }

    #[test]
    fn test_error_variant_is_not_boundary_error() {
        let err = BucketError::UnknownTimezone("X".into());
        assert!(!err.is_boundary_error());
    }
}
