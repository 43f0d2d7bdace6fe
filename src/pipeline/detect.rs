// src/pipeline/detect.rs

//! Change detection for the watched size.
//!
//! Each watch key moves through two states: unseen, then known with the last
//! observed status. The first observation only records a baseline; later
//! observations alert on a change, subject to the alert policy.

use chrono::Utc;

use crate::models::{ChangeEvent, Status, WatchConfig, WatchKey, WatchState};

/// Outcome of observing one status for a watch key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// First observation; the baseline was recorded without alerting
    Seeded(Status),
    /// Same status as last time; nothing changed
    Unchanged(Status),
    /// Status changed and the state was updated
    Changed { event: ChangeEvent, alert: bool },
}

impl Detection {
    /// The change event, if one should be notified.
    pub fn alert_event(&self) -> Option<&ChangeEvent> {
        match self {
            Detection::Changed { event, alert: true } => Some(event),
            _ => None,
        }
    }

    pub fn should_alert(&self) -> bool {
        self.alert_event().is_some()
    }
}

/// Compares fresh statuses against the persisted state.
#[derive(Debug, Clone, Copy)]
pub struct ChangeDetector {
    alert_only_when_available: bool,
}

impl ChangeDetector {
    pub fn new(alert_only_when_available: bool) -> Self {
        Self {
            alert_only_when_available,
        }
    }

    pub fn from_config(config: &WatchConfig) -> Self {
        Self::new(config.alert_only_when_available)
    }

    /// Whether a transition into `status` is worth an alert.
    pub fn alerts_on(&self, status: Status) -> bool {
        !self.alert_only_when_available || status == Status::Available
    }

    /// Observe `current` for `key`, updating `state` as needed.
    pub fn observe(&self, key: &WatchKey, current: Status, state: &mut WatchState) -> Detection {
        let Some(previous) = state.get(key) else {
            state.upsert(key, current);
            log::info!("{}: baseline '{}' recorded", key, current);
            return Detection::Seeded(current);
        };

        if previous == current {
            log::debug!("{}: unchanged ({})", key, current);
            return Detection::Unchanged(current);
        }

        state.upsert(key, current);
        let alert = self.alerts_on(current);
        let event = ChangeEvent {
            key: key.clone(),
            previous,
            current,
            detected_at: Utc::now(),
        };

        if alert {
            log::info!("{}: {} (alerting)", key, event.transition());
        } else {
            log::info!("{}: {} (alert suppressed by policy)", key, event.transition());
        }

        Detection::Changed { event, alert }
    }
}
