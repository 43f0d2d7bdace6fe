//! Service layer for the watcher.
//!
//! This module contains the business logic for:
//! - Size availability extraction (`AvailabilityExtractor`)
//! - Push notification delivery (`Notifier`, `NtfyNotifier`)
//! - Effective status selection (`StatusResolver`)

mod extractor;
mod notifier;
mod resolver;

pub use extractor::AvailabilityExtractor;
pub use notifier::{Notifier, NtfyNotifier};
pub use resolver::{ExtractedStatus, StatusOverride, StatusResolver, resolver_for};
