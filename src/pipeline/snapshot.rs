// src/pipeline/snapshot.rs

//! Human-readable size snapshots.

use crate::models::{AvailabilityMap, SizeLabel};

/// Shown for sizes that did not appear on the page.
pub const PLACEHOLDER: &str = "—";

/// One `"{label}: {status}"` line per size, in canonical order.
pub fn snapshot_lines(statuses: &AvailabilityMap) -> Vec<String> {
    SizeLabel::ALL
        .iter()
        .map(|label| match statuses.get(*label) {
            Some(status) => format!("{label}: {status}"),
            None => format!("{label}: {PLACEHOLDER}"),
        })
        .collect()
}

/// Snapshot lines joined for a message body.
pub fn render_snapshot(statuses: &AvailabilityMap) -> String {
    snapshot_lines(statuses).join("\n")
}
