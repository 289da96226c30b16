pub mod config;
pub mod group;
pub mod ranges;

use std::path::Path;

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{debug, warn};
use timebucket_core::{BucketConfig, parse_timestamp, parse_timezone};

/// Configuration, timezone and reference instant shared by all commands.
pub struct Context {
    pub config: BucketConfig,
    pub tz: Tz,
    pub reference: DateTime<Utc>,
}

impl Context {
    /// Resolve the timezone (flag, then config, then system, then UTC) and the
    /// reference instant (flag, then the current time).
    pub fn resolve(config_path: Option<&Path>, tz: Option<&str>, now: Option<&str>) -> Result<Self> {
        let config = BucketConfig::load(config_path).context("Could not load configuration")?;

        let tz = match tz {
            Some(name) => parse_timezone(name)?,
            None => match config.timezone()? {
                Some(tz) => tz,
                None => system_timezone(),
            },
        };

        let reference = match now {
            Some(s) => parse_timestamp(s, &tz).context("Invalid --now")?,
            None => Utc::now(),
        };

        debug!(
            "event=context_resolved module=cli tz={} reference={}",
            tz,
            reference.to_rfc3339()
        );

        Ok(Context {
            config,
            tz,
            reference,
        })
    }

    /// The reference instant in the comparison timezone.
    pub fn local_reference(&self) -> DateTime<Tz> {
        self.reference.with_timezone(&self.tz)
    }
}

fn system_timezone() -> Tz {
    match iana_time_zone::get_timezone() {
        Ok(name) => parse_timezone(&name).unwrap_or_else(|err| {
            warn!("event=system_tz module=cli status=fallback error={}", err);
            Tz::UTC
        }),
        Err(err) => {
            warn!("event=system_tz module=cli status=fallback error={}", err);
            Tz::UTC
        }
    }
}
