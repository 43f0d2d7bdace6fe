//! sizewatch CLI
//!
//! Runs one watch pass per invocation; schedule it with cron or CI.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use sizewatch::{
    error::{AppError, Result},
    models::{Config, ConfigOverrides, parse_flag, parse_override},
    pipeline,
    services::NtfyNotifier,
    storage::{LocalStorage, StateStorage},
    utils::HttpFetcher,
};

/// sizewatch - Frame size availability watcher
#[derive(Parser, Debug)]
#[command(
    name = "sizewatch",
    version,
    about = "Watches a product page for frame size availability"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "sizewatch.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    overrides: OverrideArgs,

    /// Defaults to `check`
    #[command(subcommand)]
    command: Option<Command>,
}

/// Settings that take precedence over the configuration file.
///
/// Typed values arrive as text so that blank environment variables count as
/// unset instead of aborting the run.
#[derive(Args, Debug)]
struct OverrideArgs {
    /// ntfy topic to publish to
    #[arg(long, env = "NTFY_TOPIC", global = true)]
    topic: Option<String>,

    /// ntfy server base URL
    #[arg(long, env = "NTFY_SERVER", global = true)]
    ntfy_server: Option<String>,

    /// Size to watch (2XS, XS, S, M, L, XL, 2XL)
    #[arg(long, env = "WATCH_SIZE", global = true)]
    size: Option<String>,

    /// Alert only on transitions into `available` (1/0, true/false)
    #[arg(long, env = "ALERT_ONLY_WHEN_AVAILABLE", global = true)]
    alert_only_when_available: Option<String>,

    /// Send a snapshot notification for every target (testing aid)
    #[arg(
        long,
        env = "FORCE_ALERT",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        global = true
    )]
    force_alert: Option<String>,

    /// Pretend the watched size has this status (testing aid)
    #[arg(long, env = "SIMULATE_CHANGE", global = true)]
    simulate_change: Option<String>,

    /// Limit --simulate-change to targets whose name contains this text
    #[arg(long, env = "SIMULATE_ONLY_TARGET", global = true)]
    simulate_only_target: Option<String>,

    /// Path to the persisted state file
    #[arg(long, env = "WATCH_STATE_FILE", global = true)]
    state: Option<PathBuf>,
}

impl TryFrom<OverrideArgs> for ConfigOverrides {
    type Error = AppError;

    fn try_from(args: OverrideArgs) -> Result<Self> {
        Ok(Self {
            topic: args.topic,
            server: args.ntfy_server,
            size: parse_override(args.size)?,
            alert_only_when_available: parse_flag(args.alert_only_when_available)?,
            force_notify: parse_flag(args.force_alert)?,
            simulate_status: parse_override(args.simulate_change)?,
            simulate_only_target: args.simulate_only_target,
            state_path: args.state,
        })
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check all targets once and notify on changes
    Check,

    /// Validate the effective configuration
    Validate,

    /// Show targets, watched size and persisted state
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let overrides = ConfigOverrides::try_from(cli.overrides)?;
    let config = Config::load_or_default(&cli.config).with_overrides(overrides);
    log::debug!("Effective configuration: {:?}", config);

    match cli.command.unwrap_or(Command::Check) {
        Command::Check => {
            config.validate()?;
            let config = Arc::new(config);

            let fetcher = HttpFetcher::new(&config.fetch)?;
            let notifier = NtfyNotifier::new(&config.notify)?;
            let storage = LocalStorage::new(&config.state.path);
            log::info!("Publishing to {}", notifier.endpoint());

            let outcome =
                pipeline::run_watch(Arc::clone(&config), &fetcher, &notifier, &storage).await?;

            if outcome.has_errors() {
                for failure in &outcome.failures {
                    log::error!("{}: {}", failure.target, failure.error);
                }
                return Ok(ExitCode::FAILURE);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "✓ Config OK ({} targets, watching {})",
                config.targets.len(),
                config.watch.size
            );
        }

        Command::Info => {
            log::info!("Watched size: {}", config.watch.size);
            log::info!(
                "Alert policy: {}",
                if config.watch.alert_only_when_available {
                    "only when available"
                } else {
                    "any change"
                }
            );
            for target in &config.targets {
                log::info!("Target: {} ({})", target.name, target.url);
            }

            let storage = LocalStorage::new(&config.state.path);
            log::info!("State file: {}", storage.path().display());

            let state = storage.load_state().await;
            if state.is_empty() {
                log::info!("No state recorded yet.");
            }
            for (key, status) in state.iter() {
                log::info!("    {}: {}", key, status);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
