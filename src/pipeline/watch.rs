// src/pipeline/watch.rs

//! Watch pipeline: check every target once and notify on changes.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{AvailabilityMap, ChangeEvent, Config, Status, Target, WatchKey, WatchState};
use crate::services::{AvailabilityExtractor, Notifier, StatusResolver, resolver_for};
use crate::storage::StateStorage;
use crate::utils::Fetcher;

use super::detect::{ChangeDetector, Detection};
use super::snapshot::{render_snapshot, snapshot_lines};

/// Result of checking a single target.
#[derive(Debug, Clone)]
pub struct TargetReport {
    pub target: String,
    pub statuses: AvailabilityMap,
    /// Effective status of the watched size after any override
    pub status: Status,
    pub detection: Detection,
}

/// A target that could not be checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFailure {
    pub target: String,
    pub error: String,
}

/// Summary of a watch run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub reports: Vec<TargetReport>,
    pub failures: Vec<TargetFailure>,
}

impl RunOutcome {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            reports: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Whether any target failed; drives the process exit code.
    pub fn has_errors(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Change events that were notified.
    pub fn alerts(&self) -> impl Iterator<Item = &ChangeEvent> {
        self.reports.iter().filter_map(|r| r.detection.alert_event())
    }
}

/// Runs one pass over all configured targets.
pub struct Watcher<'a> {
    config: Arc<Config>,
    fetcher: &'a dyn Fetcher,
    notifier: &'a dyn Notifier,
    storage: &'a dyn StateStorage,
    extractor: AvailabilityExtractor,
    resolver: Box<dyn StatusResolver>,
    detector: ChangeDetector,
}

impl<'a> Watcher<'a> {
    /// Create a watcher; the status resolver follows `config.watch`.
    pub fn new(
        config: Arc<Config>,
        fetcher: &'a dyn Fetcher,
        notifier: &'a dyn Notifier,
        storage: &'a dyn StateStorage,
    ) -> Result<Self> {
        let extractor = AvailabilityExtractor::new(&config.extractor)?;
        let resolver = resolver_for(&config.watch);
        let detector = ChangeDetector::from_config(&config.watch);

        Ok(Self {
            config,
            fetcher,
            notifier,
            storage,
            extractor,
            resolver,
            detector,
        })
    }

    /// Replace the status resolver.
    pub fn with_resolver(mut self, resolver: Box<dyn StatusResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Check every target in order, then persist the state once.
    ///
    /// A failing target is reported and skipped; it does not stop the run.
    /// Only a failure to save the state is returned as an error.
    pub async fn run(&self) -> Result<RunOutcome> {
        let mut outcome = RunOutcome::new(Utc::now());
        let mut state = self.storage.load_state().await;

        log::info!(
            "Checking {} target(s) for size {}",
            self.config.targets.len(),
            self.config.watch.size
        );

        for target in &self.config.targets {
            match self.check_target(target, &mut state).await {
                Ok(report) => outcome.reports.push(report),
                Err(error) => {
                    log::error!("Check failed for {}: {}", target.name, error);
                    self.notify_failure(target, &error).await;
                    outcome.failures.push(TargetFailure {
                        target: target.name.clone(),
                        error: error.to_string(),
                    });
                }
            }
        }

        self.storage.save_state(&state).await?;
        outcome.finished_at = Utc::now();

        log::info!(
            "Run finished: {} checked, {} failed, {} alert(s) in {} ms",
            outcome.reports.len(),
            outcome.failures.len(),
            outcome.alerts().count(),
            (outcome.finished_at - outcome.started_at).num_milliseconds()
        );

        Ok(outcome)
    }

    async fn check_target(&self, target: &Target, state: &mut WatchState) -> Result<TargetReport> {
        let html = self.fetcher.fetch(&target.url).await?;
        let statuses = self.extractor.extract(&html);

        log::info!("=== {} ===", target.name);
        for line in snapshot_lines(&statuses) {
            log::info!("    {}", line);
        }

        if self.config.watch.force_notify {
            self.notify_snapshot(target, &statuses).await;
        }

        let size = self.config.watch.size;
        let status = self.resolver.resolve(target, size, &statuses);
        let key = WatchKey::new(&target.name, size);
        let detection = self.detector.observe(&key, status, state);

        if let Some(event) = detection.alert_event() {
            self.notify_change(target, event, &statuses).await;
        }

        Ok(TargetReport {
            target: target.name.clone(),
            statuses,
            status,
            detection,
        })
    }

    async fn notify_change(&self, target: &Target, event: &ChangeEvent, statuses: &AvailabilityMap) {
        let title = format!("🔔 {} availability change", event.key.size);
        let message = format!(
            "{} – {}: {}\n{}\n\nCurrent sizes:\n{}",
            target.name,
            event.key.size,
            event.transition(),
            target.url,
            render_snapshot(statuses)
        );
        self.notifier.notify(&title, &message).await;
    }

    async fn notify_snapshot(&self, target: &Target, statuses: &AvailabilityMap) {
        let message = format!(
            "{} – FORCED SNAPSHOT\n{}\n\n{}",
            target.name,
            target.url,
            render_snapshot(statuses)
        );
        self.notifier.notify("🔔 TEST - size snapshot", &message).await;
    }

    async fn notify_failure(&self, target: &Target, error: &AppError) {
        let title = format!("Watcher error: {}", target.name);
        let message = format!("{}\n{}", target.url, error);
        self.notifier.notify(&title, &message).await;
    }
}

/// Build a watcher from `config` and run it once.
pub async fn run_watch(
    config: Arc<Config>,
    fetcher: &dyn Fetcher,
    notifier: &dyn Notifier,
    storage: &dyn StateStorage,
) -> Result<RunOutcome> {
    Watcher::new(config, fetcher, notifier, storage)?.run().await
}
