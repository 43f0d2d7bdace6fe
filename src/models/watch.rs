// src/models/watch.rs

//! Watch targets, persisted watch state and change events.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::size::{SizeLabel, Status};

/// A product page to check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Display name, unique among configured targets
    pub name: String,

    /// Product page URL
    pub url: String,
}

impl Target {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Identity of a watched (target, size) pair in the persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchKey {
    pub target: String,
    pub size: SizeLabel,
}

impl WatchKey {
    pub fn new(target: impl Into<String>, size: SizeLabel) -> Self {
        Self {
            target: target.into(),
            size,
        }
    }
}

impl fmt::Display for WatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.target, self.size)
    }
}

/// Last observed status per watch key.
///
/// Serialized as a flat JSON object keyed by `"{target}|{size}"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WatchState {
    entries: BTreeMap<String, Status>,
}

/// Entries whose value is not a known status are skipped with a warning,
/// so one stale entry never discards the rest of the file.
impl<'de> Deserialize<'de> for WatchState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;

        let entries = raw
            .into_iter()
            .filter_map(|(key, value)| {
                match value.as_str().map(str::parse::<Status>) {
                    Some(Ok(status)) => Some((key, status)),
                    _ => {
                        log::warn!("Dropping state entry {}: unrecognized status {}", key, value);
                        None
                    }
                }
            })
            .collect();

        Ok(Self { entries })
    }
}

impl WatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &WatchKey) -> Option<Status> {
        self.entries.get(&key.to_string()).copied()
    }

    /// Insert or replace the status for `key`, returning the previous one.
    pub fn upsert(&mut self, key: &WatchKey, status: Status) -> Option<Status> {
        self.entries.insert(key.to_string(), status)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Status)> + '_ {
        self.entries.iter().map(|(key, status)| (key.as_str(), *status))
    }
}

/// A status transition for a watched size that warrants notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub key: WatchKey,
    pub previous: Status,
    pub current: Status,
    pub detected_at: DateTime<Utc>,
}

impl ChangeEvent {
    /// Transition text, e.g. `unavailable → available`.
    pub fn transition(&self) -> String {
        format!("{} → {}", self.previous, self.current)
    }
}
