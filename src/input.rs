//! Reading notification records from a file or stdin.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use timebucket_core::RawNotification;

/// Read notifications from `path`, or stdin when `path` is `None` or `-`.
pub fn read_notifications(path: Option<&Path>) -> Result<Vec<RawNotification>> {
    let content = match path {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p)
            .with_context(|| format!("Could not read {}", p.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Could not read stdin")?;
            buf
        }
    };

    parse_notifications(&content)
}

/// Parse a JSON array, or one JSON object per line.
pub fn parse_notifications(content: &str) -> Result<Vec<RawNotification>> {
    let trimmed = content.trim_start();

    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("Invalid notification list");
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Invalid notification on line {}", i + 1))
        })
        .collect()
}
