// src/services/resolver.rs

//! Strategies for deciding the effective status of the watched size.
//!
//! Production runs use [`ExtractedStatus`]; [`StatusOverride`] substitutes a
//! fixed status to exercise the alert path without waiting for the shop.

use crate::models::{AvailabilityMap, SizeLabel, Status, Target, WatchConfig};

/// Decides the status fed into change detection for one target.
pub trait StatusResolver: Send + Sync {
    fn resolve(&self, target: &Target, size: SizeLabel, extracted: &AvailabilityMap) -> Status;
}

/// The status found on the page; absent sizes are unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractedStatus;

impl StatusResolver for ExtractedStatus {
    fn resolve(&self, _target: &Target, size: SizeLabel, extracted: &AvailabilityMap) -> Status {
        extracted.status_of(size)
    }
}

/// Forces a status for all targets, or only those whose name contains
/// `only_target`.
#[derive(Debug, Clone)]
pub struct StatusOverride {
    status: Status,
    only_target: Option<String>,
}

impl StatusOverride {
    pub fn new(status: Status, only_target: Option<String>) -> Self {
        Self {
            status,
            only_target: only_target.filter(|filter| !filter.is_empty()),
        }
    }

    pub fn applies_to(&self, target: &Target) -> bool {
        self.only_target
            .as_deref()
            .is_none_or(|filter| target.name.contains(filter))
    }
}

impl StatusResolver for StatusOverride {
    fn resolve(&self, target: &Target, size: SizeLabel, extracted: &AvailabilityMap) -> Status {
        if self.applies_to(target) {
            log::info!(
                "[TEST] Overriding {} for {} -> {}",
                size,
                target.name,
                self.status
            );
            self.status
        } else {
            ExtractedStatus.resolve(target, size, extracted)
        }
    }
}

/// Pick the resolver matching the watch configuration.
pub fn resolver_for(config: &WatchConfig) -> Box<dyn StatusResolver> {
    match config.simulate_status {
        Some(status) => Box::new(StatusOverride::new(
            status,
            config.simulate_only_target.clone(),
        )),
        None => Box::new(ExtractedStatus),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(name: &str) -> Target {
        Target::new(name, "https://example.com/bike")
    }

    fn map() -> AvailabilityMap {
        [(SizeLabel::Xxs, Status::Unavailable)].into_iter().collect()
    }

    #[test]
    fn test_extracted_defaults_to_unknown() {
        let resolver = ExtractedStatus;
        assert_eq!(
            resolver.resolve(&target("A"), SizeLabel::Xxs, &map()),
            Status::Unavailable
        );
        assert_eq!(
            resolver.resolve(&target("A"), SizeLabel::M, &map()),
            Status::Unknown
        );
    }

    #[test]
    fn test_override_applies_to_all_without_filter() {
        let resolver = StatusOverride::new(Status::Available, None);
        assert_eq!(
            resolver.resolve(&target("Canyon Allroad R138_P01"), SizeLabel::Xxs, &map()),
            Status::Available
        );
        assert_eq!(
            resolver.resolve(&target("Anything"), SizeLabel::Xxs, &map()),
            Status::Available
        );
    }

    #[test]
    fn test_override_respects_name_filter() {
        let resolver = StatusOverride::new(Status::Available, Some("R138_P01".to_string()));
        assert_eq!(
            resolver.resolve(&target("Canyon Allroad R138_P01"), SizeLabel::Xxs, &map()),
            Status::Available
        );
        assert_eq!(
            resolver.resolve(&target("Canyon Allroad R138_P02"), SizeLabel::Xxs, &map()),
            Status::Unavailable
        );
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let resolver = StatusOverride::new(Status::Unknown, Some(String::new()));
        assert!(resolver.applies_to(&target("Any")));
    }

    #[test]
    fn test_resolver_for_config() {
        let mut config = WatchConfig::default();
        assert_eq!(
            resolver_for(&config).resolve(&target("A"), SizeLabel::Xxs, &map()),
            Status::Unavailable
        );

        config.simulate_status = Some(Status::Available);
        assert_eq!(
            resolver_for(&config).resolve(&target("A"), SizeLabel::Xxs, &map()),
            Status::Available
        );
    }
}
