//! Configuration for a cancellation series.

use crate::errors::{CancelSeriesError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a [`CancellationSeries`](crate::cancellation::CancellationSeries).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesConfig {
    /// Name used in log lines and events.
    #[serde(default = "default_name")]
    pub name: String,
    /// Cancellation reason given to a handle replaced by `next`.
    #[serde(default = "default_supersede_reason")]
    pub supersede_reason: String,
    /// Cancellation reason given to a handle retired by `clear`.
    #[serde(default = "default_clear_reason")]
    pub clear_reason: String,
    /// Cancellation reason given to a handle whose lease completed.
    #[serde(default = "default_complete_reason")]
    pub complete_reason: String,
    /// Whether the async variants retire handles on the blocking pool.
    #[serde(default = "default_offload_async_signal")]
    pub offload_async_signal: bool,
}

fn default_name() -> String {
    "series".to_string()
}

fn default_supersede_reason() -> String {
    "superseded".to_string()
}

fn default_clear_reason() -> String {
    "cleared".to_string()
}

fn default_complete_reason() -> String {
    "completed".to_string()
}

fn default_offload_async_signal() -> bool {
    true
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            supersede_reason: default_supersede_reason(),
            clear_reason: default_clear_reason(),
            complete_reason: default_complete_reason(),
            offload_async_signal: default_offload_async_signal(),
        }
    }
}

impl SeriesConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the series name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the reason used when a handle is superseded.
    #[must_use]
    pub fn with_supersede_reason(mut self, reason: impl Into<String>) -> Self {
        self.supersede_reason = reason.into();
        self
    }

    /// Sets the reason used when a handle is cleared.
    #[must_use]
    pub fn with_clear_reason(mut self, reason: impl Into<String>) -> Self {
        self.clear_reason = reason.into();
        self
    }

    /// Sets the reason used when a lease completes.
    #[must_use]
    pub fn with_complete_reason(mut self, reason: impl Into<String>) -> Self {
        self.complete_reason = reason.into();
        self
    }

    /// Sets whether async retirement is offloaded to the blocking pool.
    #[must_use]
    pub fn with_offload_async_signal(mut self, offload: bool) -> Self {
        self.offload_async_signal = offload;
        self
    }

    /// Parses a configuration from JSON, filling in defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Checks that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CancelSeriesError::InvalidConfig(
                "series name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
