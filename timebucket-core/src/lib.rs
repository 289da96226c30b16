//! Core types for timebucket.
//!
//! Groups timestamped records into labeled, non-overlapping ranges relative to
//! a reference instant, for rendering as a sectioned list:
//! - `boundary` declares the ranges ("today", "yesterday", ...) as day offsets
//! - `bucketer` partitions records into those ranges
//! - `labels` maps range keys to display titles
//! - `config` loads ranges, titles and timezone from a TOML file
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use timebucket_core::TimeBucketer;
//!
//! let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
//! let items = [
//!     Utc.with_ymd_and_hms(2024, 6, 10, 8, 0, 0).unwrap(),
//!     Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
//! ];
//!
//! let buckets = TimeBucketer::default().group(&items, &now);
//! assert_eq!(buckets[0].key, "today");
//! assert_eq!(buckets[1].key, "earlier");
//! ```

pub mod boundary;
pub mod bucketer;
pub mod config;
pub mod error;
pub mod item;
pub mod labels;
pub mod timestamp;

pub use boundary::{Boundary, BoundarySet, Cutoff, ResolvedBoundary, start_of_day};
pub use bucketer::{Bucket, Grouping, MalformedPolicy, Skipped, TimeBucketer, group_by_date};
pub use config::{BucketConfig, RangeConfig};
pub use error::{BucketError, BucketResult};
pub use item::{Notification, RawNotification, Timestamped};
pub use labels::Labels;
pub use timestamp::{parse_timestamp, parse_timezone};
