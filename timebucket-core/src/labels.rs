//! Display titles for range keys.

use std::collections::BTreeMap;

use crate::boundary::{EARLIER, THIS_WEEK, TODAY, YESTERDAY};

/// Maps range keys to section titles.
///
/// Keys without an entry are shown as the key itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    titles: BTreeMap<String, String>,
}

impl Default for Labels {
    fn default() -> Self {
        Labels::empty()
            .with(TODAY, "Today")
            .with(YESTERDAY, "Yesterday")
            .with(THIS_WEEK, "This week")
            .with(EARLIER, "Earlier")
    }
}

impl Labels {
    pub fn empty() -> Self {
        Labels {
            titles: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, title: impl Into<String>) -> Self {
        self.titles.insert(key.into(), title.into());
        self
    }

    /// Apply overrides on top of the current titles.
    pub fn merged<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, title) in overrides {
            self.titles.insert(key.into(), title.into());
        }
        self
    }

    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.titles.get(key).map(String::as_str).unwrap_or(key)
    }
}
