//! User configuration for timebucket.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::boundary::{Boundary, BoundarySet};
use crate::bucketer::{MalformedPolicy, TimeBucketer};
use crate::error::{BucketError, BucketResult};
use crate::labels::Labels;
use crate::timestamp::parse_timezone;

const ENV_PREFIX: &str = "TIMEBUCKET";

/// One entry of the `[[ranges]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeConfig {
    pub key: String,

    /// Days back from the start of today. Absent means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
}

impl From<&RangeConfig> for Boundary {
    fn from(range: &RangeConfig) -> Self {
        match range.days {
            Some(days) => Boundary::days_ago(range.key.clone(), days),
            None => Boundary::unbounded(range.key.clone()),
        }
    }
}

/// Configuration at ~/.config/timebucket/config.toml
///
/// Every field is optional; an empty file gives the default ranges and
/// English titles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    #[serde(default)]
    pub malformed: MalformedPolicy,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ranges: Vec<RangeConfig>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl BucketConfig {
    pub fn config_path() -> BucketResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| BucketError::Config("Could not determine config directory".into()))?
            .join("timebucket");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from `path`, or the default location when `None`.
    ///
    /// A missing file is not an error. Environment variables prefixed with
    /// `TIMEBUCKET_` override file values.
    pub fn load(path: Option<&Path>) -> BucketResult<Self> {
        let path = match path {
            Some(p) => expand_path(p),
            None => Self::config_path()?,
        };

        Self::load_from(&path, Some(environment()))
    }

    fn load_from(path: &Path, env: Option<Environment>) -> BucketResult<Self> {
        let mut builder = Config::builder()
            .add_source(File::from(path.to_path_buf()).format(FileFormat::Toml).required(false));

        if let Some(env) = env {
            builder = builder.add_source(env);
        }

        builder
            .build()
            .map_err(|e| BucketError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| BucketError::Config(e.to_string()))
    }

    /// The configured timezone, if any.
    pub fn timezone(&self) -> BucketResult<Option<Tz>> {
        self.timezone.as_deref().map(parse_timezone).transpose()
    }

    /// The configured ranges, validated. No ranges means the defaults.
    pub fn boundaries(&self) -> BucketResult<BoundarySet> {
        if self.ranges.is_empty() {
            return Ok(BoundarySet::default());
        }
        BoundarySet::new(self.ranges.iter().map(Boundary::from).collect())
    }

    pub fn bucketer(&self) -> BucketResult<TimeBucketer> {
        Ok(TimeBucketer::new(self.boundaries()?))
    }

    /// English titles with the configured overrides applied.
    pub fn labels(&self) -> Labels {
        Labels::default().merged(self.labels.clone())
    }

    /// Save the current config to `path`.
    pub fn save(&self, path: &Path) -> BucketResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| BucketError::Serialization(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> BucketResult<()> {
        let contents = "\
# timebucket configuration

# Timezone used to decide where a day starts (IANA name).
# Defaults to the system timezone.
# timezone = \"Europe/Berlin\"

# What to do with records whose timestamp cannot be read: \"skip\" or \"earliest\".
# malformed = \"skip\"

# Ranges, most recent first. `days` counts back from the start of today;
# leave it out on the last range to make it unbounded.
# [[ranges]]
# key = \"today\"
# days = 0
#
# [[ranges]]
# key = \"yesterday\"
# days = 1
#
# [[ranges]]
# key = \"this_week\"
# days = 7
#
# [[ranges]]
# key = \"earlier\"

# Section titles per range key.
# [labels]
# today = \"Today\"
# this_week = \"This week\"
";

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;

        Ok(())
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
}

/// Expand a leading `~` to the home directory.
pub fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}
