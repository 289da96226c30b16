//! Terminal and JSON rendering for grouped notifications.

use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use owo_colors::OwoColorize;
use serde::Serialize;
use timebucket_core::{
    Bucket, Grouping, Labels, Notification, RawNotification, ResolvedBoundary, Skipped,
};

/// Everything rendering needs besides the data itself.
pub struct View<'a> {
    pub labels: &'a Labels,
    pub tz: Tz,
    pub reference: DateTime<Utc>,
}

impl View<'_> {
    fn instant_of(&self, raw: &RawNotification) -> Option<DateTime<Utc>> {
        raw.created_at_in(&self.tz).ok()
    }

    /// "14:05" for today, "Sun Jun 9 14:05" otherwise.
    fn format_time(&self, at: Option<DateTime<Utc>>) -> String {
        let Some(at) = at else {
            return "?".to_string();
        };
        let local = at.with_timezone(&self.tz);
        let today = self.reference.with_timezone(&self.tz).date_naive();

        if local.date_naive() == today {
            local.format("%H:%M").to_string()
        } else {
            local.format("%a %b %-d %H:%M").to_string()
        }
    }

    fn format_instant(&self, at: Option<DateTime<Utc>>, unbounded: &str) -> String {
        at.map(|at| at.with_timezone(&self.tz).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| unbounded.to_string())
    }
}

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self, view: &View) -> String;
}

impl Render for Bucket<'_, RawNotification> {
    fn render(&self, view: &View) -> String {
        let mut lines = vec![view.labels.get(&self.key).bold().to_string()];

        for item in &self.items {
            let at = view.instant_of(item);
            let marker = if item.read { " " } else { "●" };
            let age = at
                .map(|at| relative_age(at, view.reference))
                .unwrap_or_default();

            lines.push(format!(
                "  {} {:>16}  {} {}",
                marker.cyan(),
                view.format_time(at),
                item.title,
                age.dimmed()
            ));
        }

        lines.join("\n")
    }
}

impl Render for Skipped<'_, RawNotification> {
    fn render(&self, _view: &View) -> String {
        format!(
            "  #{} {} {}",
            self.index,
            self.item.id,
            self.reason.red()
        )
    }
}

impl Render for Grouping<'_, RawNotification> {
    fn render(&self, view: &View) -> String {
        if self.is_empty() {
            return "No notifications".dimmed().to_string();
        }

        let mut sections: Vec<String> = self.buckets.iter().map(|b| b.render(view)).collect();

        if !self.skipped.is_empty() {
            let count = self.skipped.len();
            let mut lines = vec![format!(
                "Skipped {} {} with unreadable timestamps:",
                count,
                pluralize("notification", count)
            )
            .yellow()
            .to_string()];
            lines.extend(self.skipped.iter().map(|s| s.render(view)));
            sections.push(lines.join("\n"));
        }

        sections.join("\n\n")
    }
}

impl Render for ResolvedBoundary {
    fn render(&self, view: &View) -> String {
        format!(
            "  {:<12} {} → {}  {}",
            view.labels.get(&self.key).bold(),
            view.format_instant(self.from, "…"),
            view.format_instant(self.until, "…"),
            format!("({})", self.key).dimmed()
        )
    }
}

/// Coarse age such as "4h 3m ago", or "2days 5h ago" past one day.
pub fn relative_age(at: DateTime<Utc>, reference: DateTime<Utc>) -> String {
    let secs = (reference - at).num_seconds();

    if secs < 0 {
        return "in the future".to_string();
    }
    if secs < 60 {
        return "just now".to_string();
    }

    let secs = secs as u64;
    let granularity = if secs >= 86_400 { 3_600 } else { 60 };
    let rounded = std::time::Duration::from_secs(secs - secs % granularity);

    format!("{} ago", humantime::format_duration(rounded))
}

/// Simple pluralization helper
fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    buckets: Vec<JsonBucket<'a>>,
    skipped: Vec<JsonSkipped<'a>>,
}

#[derive(Serialize)]
struct JsonBucket<'a> {
    key: &'a str,
    label: &'a str,
    items: Vec<JsonItem<'a>>,
}

/// Readable records are emitted with `createdAt` normalized to UTC; the rest
/// keep their original value.
#[derive(Serialize)]
#[serde(untagged)]
enum JsonItem<'a> {
    Parsed(Notification),
    Unparsed(&'a RawNotification),
}

impl<'a> JsonItem<'a> {
    fn new(raw: &'a RawNotification, tz: &Tz) -> Self {
        match raw.parse(tz) {
            Ok(notification) => JsonItem::Parsed(notification),
            Err(_) => JsonItem::Unparsed(raw),
        }
    }
}

#[derive(Serialize)]
struct JsonSkipped<'a> {
    index: usize,
    id: &'a str,
    reason: &'a str,
}

/// Render as pretty JSON with labels applied and timestamps normalized to UTC.
pub fn render_json(grouping: &Grouping<'_, RawNotification>, view: &View) -> Result<String> {
    let output = JsonOutput {
        buckets: grouping
            .buckets
            .iter()
            .map(|bucket| JsonBucket {
                key: &bucket.key,
                label: view.labels.get(&bucket.key),
                items: bucket
                    .items
                    .iter()
                    .map(|item| JsonItem::new(item, &view.tz))
                    .collect(),
            })
            .collect(),
        skipped: grouping
            .skipped
            .iter()
            .map(|s| JsonSkipped {
                index: s.index,
                id: &s.item.id,
                reason: &s.reason,
            })
            .collect(),
    };

    Ok(serde_json::to_string_pretty(&output)?)
}
