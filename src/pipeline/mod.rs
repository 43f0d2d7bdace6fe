//! Pipeline entry points for watch operations.
//!
//! - `run_watch`: Check all targets once, notify, persist state
//! - `ChangeDetector`: Decide whether a status transition alerts
//! - `snapshot_lines`: Render a size snapshot

pub mod detect;
pub mod snapshot;
pub mod watch;

pub use detect::{ChangeDetector, Detection};
pub use snapshot::{PLACEHOLDER, render_snapshot, snapshot_lines};
pub use watch::{RunOutcome, TargetFailure, TargetReport, Watcher, run_watch};
