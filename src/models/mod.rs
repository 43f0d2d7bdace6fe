// src/models/mod.rs

//! Domain models for the watcher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod size;
mod watch;

// Re-export all public types
pub use config::{
    Config, ConfigOverrides, ExtractorConfig, FetchConfig, NotifyConfig, StateConfig, WatchConfig,
    parse_flag, parse_override,
};
pub use size::{AvailabilityMap, SizeLabel, Status};
pub use watch::{ChangeEvent, Target, WatchKey, WatchState};
