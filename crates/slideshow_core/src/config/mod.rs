//! Buildfile configuration.
//!
//! This module provides:
//! - TOML buildfiles with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Validation on load with defaults for every missing field
//!
//! # Example
//!
//! ```no_run
//! use slideshow_core::config::ConfigManager;
//!
//! let mut config = ConfigManager::new("holiday.toml");
//! config.load().unwrap();
//!
//! println!("Profile: {}", config.settings().show.profile);
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, LoggingSettings, PathSettings, Settings, ShowSettings, SourceSettings,
    ToolSettings,
};
