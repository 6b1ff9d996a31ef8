//! Drive configuration: timeouts and pre-command tokens.
//!
//! All knobs are also exposed as CLI flags; a flag always wins over the
//! config file, which wins over the built-in defaults.

use std::time::Duration;

use serde::Deserialize;

use crate::dispatch::Timeouts;
use crate::{AppError, Result};

/// Runtime configuration for a drive session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct DriveConfig {
    /// Silence window for ordinary commands, in seconds.
    #[serde(default = "default_short_timeout")]
    pub short_timeout: f64,
    /// Silence window for the slow command and the banner read, in seconds.
    #[serde(default = "default_long_timeout")]
    pub long_timeout: f64,
    /// TCP connect deadline, in seconds. Unused for local targets.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: f64,
    /// Command tokens replayed once after connecting.
    ///
    /// `None` selects the built-in default sequence; an explicit list — even
    /// an empty one — overrides it entirely.
    #[serde(default)]
    pub pre_commands: Option<Vec<String>>,
}

fn default_short_timeout() -> f64 {
    0.4
}

fn default_long_timeout() -> f64 {
    1.0
}

fn default_connect_timeout() -> f64 {
    5.0
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            short_timeout: default_short_timeout(),
            long_timeout: default_long_timeout(),
            connect_timeout: default_connect_timeout(),
            pre_commands: None,
        }
    }
}

impl DriveConfig {
    /// Parse a configuration from TOML text and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] on malformed TOML, unknown fields, or
    /// out-of-range timeout values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject non-positive or non-finite timeout values.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("short_timeout", self.short_timeout),
            ("long_timeout", self.long_timeout),
            ("connect_timeout", self.connect_timeout),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(AppError::Config(format!(
                    "{name} must be a positive number of seconds, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// The per-payload silence windows as [`Duration`]s.
    #[must_use]
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            short: Duration::from_secs_f64(self.short_timeout),
            long: Duration::from_secs_f64(self.long_timeout),
        }
    }

    /// The TCP connect deadline as a [`Duration`].
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.connect_timeout)
    }
}
