//! Records that can be grouped by date.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::BucketResult;
use crate::timestamp::parse_timestamp;

/// Anything with a creation instant.
///
/// The bucketer only ever reads this value; it never mutates the record.
pub trait Timestamped {
    fn instant(&self) -> DateTime<Utc>;
}

impl Timestamped for DateTime<Utc> {
    fn instant(&self) -> DateTime<Utc> {
        *self
    }
}

impl<T: Timestamped + ?Sized> Timestamped for &T {
    fn instant(&self) -> DateTime<Utc> {
        (**self).instant()
    }
}

/// A notification shown in a sectioned list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

impl Timestamped for Notification {
    fn instant(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// A notification as it arrives from input, with the timestamp not yet parsed.
///
/// Keeping `created_at` as text lets one bad record be reported on its own
/// instead of failing the whole batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNotification {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default)]
    pub created_at: serde_json::Value,
    #[serde(default)]
    pub read: bool,
}

impl RawNotification {
    /// The raw timestamp as text. Numbers are rendered without quotes.
    pub fn created_at_text(&self) -> String {
        match &self.created_at {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Parse the creation timestamp, reading naive values in `tz`.
    pub fn created_at_in(&self, tz: &Tz) -> BucketResult<DateTime<Utc>> {
        parse_timestamp(&self.created_at_text(), tz)
    }

    pub fn parse(&self, tz: &Tz) -> BucketResult<Notification> {
        Ok(Notification {
            id: self.id.clone(),
            title: self.title.clone(),
            body: self.body.clone(),
            created_at: self.created_at_in(tz)?,
            read: self.read,
        })
    }
}
