//! Configuration management for mkshbootimg.
//!
//! Reads configuration from a .env file and environment variables.
//! Environment variables take precedence over .env file.

use std::collections::HashMap;

use tracing::debug;

/// Default log filter when nothing is configured.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// mkshbootimg configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// tracing-subscriber filter directive (e.g., "debug", "shbootimg=trace")
    pub log_filter: String,
}

impl Config {
    /// Load configuration from .env (if present) and the environment.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from an explicit set of variables.
    ///
    /// `MKSHBOOTIMG_LOG` wins over `RUST_LOG`.
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let env_vars: HashMap<String, String> = vars.into_iter().collect();

        let log_filter = env_vars
            .get("MKSHBOOTIMG_LOG")
            .or_else(|| env_vars.get("RUST_LOG"))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Self { log_filter }
    }

    /// Log configuration for debugging.
    pub fn print(&self) {
        debug!(log_filter = %self.log_filter, "configuration loaded");
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}
