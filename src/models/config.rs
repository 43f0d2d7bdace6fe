//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::services::AvailabilityExtractor;

use super::size::{SizeLabel, Status};
use super::watch::Target;

/// Upper bound for the retry backoff unit (one minute).
const MAX_RETRY_DELAY_MS: u64 = 60_000;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Push notification settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Watched size and alerting policy
    #[serde(default)]
    pub watch: WatchConfig,

    /// HTTP fetch behavior settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Size-selector markup rules
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Persisted state location
    #[serde(default)]
    pub state: StateConfig,

    /// Product pages to check, in order
    #[serde(default = "defaults::targets")]
    pub targets: Vec<Target>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply command-line / environment overrides on top of file values.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(topic) = non_empty(overrides.topic) {
            self.notify.topic = topic;
        }
        if let Some(server) = non_empty(overrides.server) {
            self.notify.server = server;
        }
        if let Some(size) = overrides.size {
            self.watch.size = size;
        }
        if let Some(flag) = overrides.alert_only_when_available {
            self.watch.alert_only_when_available = flag;
        }
        if let Some(flag) = overrides.force_notify {
            self.watch.force_notify = flag;
        }
        if let Some(status) = overrides.simulate_status {
            self.watch.simulate_status = Some(status);
        }
        if let Some(filter) = non_empty(overrides.simulate_only_target) {
            self.watch.simulate_only_target = Some(filter);
        }
        if let Some(path) = overrides.state_path.filter(|p| !p.as_os_str().is_empty()) {
            self.state.path = path;
        }
        self
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.notify.topic.trim().is_empty() {
            return Err(AppError::validation("notify.topic is empty"));
        }
        url::Url::parse(&self.notify.server)
            .map_err(|e| AppError::validation(format!("notify.server is invalid: {e}")))?;
        if self.notify.timeout_secs == 0 {
            return Err(AppError::validation("notify.timeout_secs must be > 0"));
        }
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::validation("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.max_attempts == 0 {
            return Err(AppError::validation("fetch.max_attempts must be > 0"));
        }
        if self.fetch.retry_delay_ms > MAX_RETRY_DELAY_MS {
            return Err(AppError::validation(format!(
                "fetch.retry_delay_ms must be <= {MAX_RETRY_DELAY_MS}"
            )));
        }
        if self.watch.simulate_only_target.is_some() && self.watch.simulate_status.is_none() {
            return Err(AppError::validation(
                "watch.simulate_only_target requires watch.simulate_status",
            ));
        }
        if self.targets.is_empty() {
            return Err(AppError::validation("No targets defined"));
        }

        let mut names = HashSet::new();
        for target in &self.targets {
            if target.name.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "Target with URL {} has an empty name",
                    target.url
                )));
            }
            if !names.insert(target.name.as_str()) {
                return Err(AppError::validation(format!(
                    "Duplicate target name '{}'",
                    target.name
                )));
            }
            url::Url::parse(&target.url).map_err(|e| {
                AppError::validation(format!("Target '{}' has invalid URL: {e}", target.name))
            })?;
        }

        AvailabilityExtractor::new(&self.extractor)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            notify: NotifyConfig::default(),
            watch: WatchConfig::default(),
            fetch: FetchConfig::default(),
            extractor: ExtractorConfig::default(),
            state: StateConfig::default(),
            targets: defaults::targets(),
        }
    }
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub topic: Option<String>,
    pub server: Option<String>,
    pub size: Option<SizeLabel>,
    pub alert_only_when_available: Option<bool>,
    pub force_notify: Option<bool>,
    pub simulate_status: Option<Status>,
    pub simulate_only_target: Option<String>,
    pub state_path: Option<PathBuf>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an override given as text; blank text counts as unset.
pub fn parse_override<T>(value: Option<String>) -> Result<Option<T>>
where
    T: FromStr<Err = AppError>,
{
    non_empty(value).map(|v| v.parse()).transpose()
}

/// Parse a boolean override (`1/0`, `true/false`, `yes/no`, `on/off`);
/// blank text counts as unset.
pub fn parse_flag(value: Option<String>) -> Result<Option<bool>> {
    let Some(value) = non_empty(value) else {
        return Ok(None);
    };
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "n" | "off" => Ok(Some(false)),
        _ => Err(AppError::parse("flag", value)),
    }
}

/// ntfy push settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// ntfy server base URL
    #[serde(default = "defaults::ntfy_server")]
    pub server: String,

    /// Topic the phone app subscribes to
    #[serde(default = "defaults::ntfy_topic")]
    pub topic: String,

    /// Value of the `Priority` header
    #[serde(default = "defaults::priority")]
    pub priority: String,

    /// Publish request timeout in seconds
    #[serde(default = "defaults::notify_timeout")]
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            server: defaults::ntfy_server(),
            topic: defaults::ntfy_topic(),
            priority: defaults::priority(),
            timeout_secs: defaults::notify_timeout(),
        }
    }
}

/// Watched size, alert policy and test aids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// The single size whose transitions trigger alerts
    #[serde(default = "defaults::watch_size")]
    pub size: SizeLabel,

    /// Alert only on transitions into `available`
    #[serde(default = "defaults::alert_only_when_available")]
    pub alert_only_when_available: bool,

    /// Send a snapshot notification for every target on every run
    #[serde(default)]
    pub force_notify: bool,

    /// Replace the observed status of the watched size (testing only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulate_status: Option<Status>,

    /// Restrict `simulate_status` to targets whose name contains this text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulate_only_target: Option<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            size: defaults::watch_size(),
            alert_only_when_available: defaults::alert_only_when_available(),
            force_notify: false,
            simulate_status: None,
            simulate_only_target: None,
        }
    }
}

/// HTTP client and retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Accept-Language header
    #[serde(default = "defaults::accept_language")]
    pub accept_language: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::fetch_timeout")]
    pub timeout_secs: u64,

    /// Attempts per page before giving up
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Backoff unit; attempt `n` waits `n * retry_delay_ms` before retrying
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            accept_language: defaults::accept_language(),
            timeout_secs: defaults::fetch_timeout(),
            max_attempts: defaults::max_attempts(),
            retry_delay_ms: defaults::retry_delay(),
        }
    }
}

/// Markup rules for locating size-selector controls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// CSS selector matching each size-selector control
    #[serde(default = "defaults::control_selector")]
    pub control_selector: String,

    /// Attribute carrying the size label
    #[serde(default = "defaults::size_attribute")]
    pub size_attribute: String,

    /// Class marking a purchasable size
    #[serde(default = "defaults::purchasable_class")]
    pub purchasable_class: String,

    /// Class marking an unpurchasable size
    #[serde(default = "defaults::unpurchasable_class")]
    pub unpurchasable_class: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            control_selector: defaults::control_selector(),
            size_attribute: defaults::size_attribute(),
            purchasable_class: defaults::purchasable_class(),
            unpurchasable_class: defaults::unpurchasable_class(),
        }
    }
}

/// State file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default = "defaults::state_path")]
    pub path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: defaults::state_path(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    use super::{SizeLabel, Target};

    // Notify defaults
    pub fn ntfy_server() -> String {
        "https://ntfy.sh".into()
    }
    pub fn ntfy_topic() -> String {
        "canyon-size-alert".into()
    }
    pub fn priority() -> String {
        "high".into()
    }
    pub fn notify_timeout() -> u64 {
        12
    }

    // Watch defaults
    pub fn watch_size() -> SizeLabel {
        SizeLabel::Xxs
    }
    pub fn alert_only_when_available() -> bool {
        true
    }

    // Fetch defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36"
            .into()
    }
    pub fn accept_language() -> String {
        "pl-PL,pl;q=0.9,en-US;q=0.8,en;q=0.7".into()
    }
    pub fn fetch_timeout() -> u64 {
        25
    }
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn retry_delay() -> u64 {
        1000
    }

    // Extractor defaults
    pub fn control_selector() -> String {
        "button.productConfiguration__selectVariant".into()
    }
    pub fn size_attribute() -> String {
        "data-product-size".into()
    }
    pub fn purchasable_class() -> String {
        "productConfiguration__selectVariant--purchasable".into()
    }
    pub fn unpurchasable_class() -> String {
        "productConfiguration__selectVariant--unpurchasable".into()
    }

    pub fn state_path() -> PathBuf {
        PathBuf::from("watch_state.json")
    }

    // Target defaults
    pub fn targets() -> Vec<Target> {
        vec![
            Target::new(
                "Canyon Allroad R138_P01",
                "https://www.canyon.com/pl-pl/rowery-szosowe/endurance-bikes/endurace/allroad/endurace-allroad/4164.html?dwvar_4164_pv_rahmenfarbe=R138_P01",
            ),
            Target::new(
                "Canyon Allroad R138_P02",
                "https://www.canyon.com/pl-pl/rowery-szosowe/endurance-bikes/endurace/allroad/endurace-allroad/4164.html?dwvar_4164_pv_rahmenfarbe=R138_P02#configuration-anchor",
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_topic() {
        let mut config = Config::default();
        config.notify.topic = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_override_treats_blank_as_unset() {
        assert_eq!(parse_override::<Status>(None).unwrap(), None);
        assert_eq!(parse_override::<Status>(Some(String::new())).unwrap(), None);
        assert_eq!(parse_override::<SizeLabel>(Some("  ".into())).unwrap(), None);
        assert_eq!(
            parse_override::<Status>(Some(" available ".into())).unwrap(),
            Some(Status::Available)
        );
        assert_eq!(
            parse_override::<SizeLabel>(Some("M".into())).unwrap(),
            Some(SizeLabel::M)
        );
        assert!(parse_override::<Status>(Some("test".into())).is_err());
    }

    #[test]
    fn parse_flag_values() {
        assert_eq!(parse_flag(None).unwrap(), None);
        assert_eq!(parse_flag(Some(String::new())).unwrap(), None);
        assert_eq!(parse_flag(Some("1".into())).unwrap(), Some(true));
        assert_eq!(parse_flag(Some("TRUE".into())).unwrap(), Some(true));
        assert_eq!(parse_flag(Some("0".into())).unwrap(), Some(false));
        assert_eq!(parse_flag(Some("off".into())).unwrap(), Some(false));
        assert!(parse_flag(Some("maybe".into())).is_err());
    }

    #[test]
    fn blank_state_path_override_is_ignored() {
        let config = Config::default().with_overrides(ConfigOverrides {
            state_path: Some(PathBuf::new()),
            ..ConfigOverrides::default()
        });
        assert_eq!(config.state.path, PathBuf::from("watch_state.json"));
    }

    #[test]
    fn validate_rejects_excessive_retry_delay() {
        let mut config = Config::default();
        config.fetch.retry_delay_ms = u64::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_attempts() {
        let mut config = Config::default();
        config.fetch.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_targets() {
        let mut config = Config::default();
        let first = config.targets[0].clone();
        config.targets.push(first);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_selector() {
        let mut config = Config::default();
        config.extractor.control_selector = "[[invalid".to_string();
        assert!(matches!(
            config.validate(),
            Err(AppError::Selector { .. })
        ));
    }

    #[test]
    fn validate_rejects_filter_without_status() {
        let mut config = Config::default();
        config.watch.simulate_only_target = Some("P01".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [watch]
            size = "M"
            alert_only_when_available = false

            [[targets]]
            name = "Grizl"
            url = "https://example.com/grizl"
            "#,
        )
        .unwrap();

        assert_eq!(config.watch.size, SizeLabel::M);
        assert!(!config.watch.alert_only_when_available);
        assert_eq!(config.targets.len(), 1);
        assert_eq!(config.fetch.max_attempts, 3);
        assert_eq!(config.notify.server, "https://ntfy.sh");
    }

    #[test]
    fn overrides_replace_file_values() {
        let overrides = ConfigOverrides {
            topic: Some("my-topic".to_string()),
            size: Some(SizeLabel::L),
            alert_only_when_available: Some(false),
            simulate_status: Some(Status::Available),
            simulate_only_target: Some("   ".to_string()),
            ..ConfigOverrides::default()
        };
        let config = Config::default().with_overrides(overrides);

        assert_eq!(config.notify.topic, "my-topic");
        assert_eq!(config.watch.size, SizeLabel::L);
        assert!(!config.watch.alert_only_when_available);
        assert_eq!(config.watch.simulate_status, Some(Status::Available));
        assert_eq!(config.watch.simulate_only_target, None);
        assert!(!config.watch.force_notify);
    }
}
