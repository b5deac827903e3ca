//! Deployment configuration for the lead pipeline.
//!
//! Configuration is read from a TOML file:
//!
//! ```toml
//! local_offset_minutes = -180
//!
//! [rules]
//! exempt_stages = ["6f1c0b8e-0a4e-4d0a-9a57-1d1f2b3c4d5e"]
//! task_optional_stages = []
//! escalation_trigger_stages = ["0b5e7c2a-3f4d-4e6f-8a9b-1c2d3e4f5a6b"]
//! escalation_stage = "9d8c7b6a-5f4e-4d3c-2b1a-0f9e8d7c6b5a"
//!
//! [sweep]
//! enabled = true
//! poll_interval_secs = 60
//! lookahead_secs = 300
//! ```

use crate::pipeline::{
    domain::{StageRules, StageRulesError},
    services::{SweepSettings, SweepSettingsError, TransitionSettings},
};
use chrono::{FixedOffset, TimeDelta};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const MAX_OFFSET_MINUTES: u32 = 14 * 60;
const SECONDS_PER_MINUTE: i32 = 60;

/// Reminder sweep scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    /// Run the sweep at all.
    pub enabled: bool,
    /// Seconds between polling passes.
    pub poll_interval_secs: u64,
    /// Near-due window in seconds.
    pub lookahead_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: 60,
            lookahead_secs: 300,
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Stage rules driving the transition gate and the sweep.
    pub rules: StageRules,
    /// Sweep scheduling.
    pub sweep: SweepConfig,
    /// Offset from UTC, in minutes, used to read follow-up due dates.
    pub local_offset_minutes: i32,
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration from {path}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not valid configuration TOML.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// The local offset is outside ±14 hours.
    #[error("local offset of {0} minutes is outside ±14 hours")]
    InvalidOffset(i32),
    /// The polling interval is zero.
    #[error("sweep poll interval must be positive")]
    ZeroPollInterval,
    /// The lookahead does not fit a time delta.
    #[error("sweep lookahead of {0} seconds is too large")]
    LookaheadOutOfRange(u64),
    /// The stage rules are inconsistent.
    #[error(transparent)]
    Rules(#[from] StageRulesError),
    /// The sweep cannot run with these rules.
    #[error(transparent)]
    Sweep(#[from] SweepSettingsError),
}

impl PipelineConfig {
    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and the
    /// [`Self::validate`] errors otherwise.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read and the
    /// [`Self::from_toml_str`] errors otherwise.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "loading pipeline configuration");
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks values that deserialization cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOffset`], [`ConfigError::Rules`], and,
    /// when the sweep is enabled, [`ConfigError::ZeroPollInterval`] or
    /// [`ConfigError::LookaheadOutOfRange`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.local_offset()?;
        self.rules.validate()?;
        if self.sweep.enabled {
            if self.sweep.poll_interval_secs == 0 {
                return Err(ConfigError::ZeroPollInterval);
            }
            self.lookahead()?;
        }
        Ok(())
    }

    /// Returns the local UTC offset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOffset`] outside ±14 hours.
    pub fn local_offset(&self) -> Result<FixedOffset, ConfigError> {
        let minutes = self.local_offset_minutes;
        if minutes.unsigned_abs() > MAX_OFFSET_MINUTES {
            return Err(ConfigError::InvalidOffset(minutes));
        }
        FixedOffset::east_opt(minutes * SECONDS_PER_MINUTE)
            .ok_or(ConfigError::InvalidOffset(minutes))
    }

    /// Returns the sweep polling interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.sweep.poll_interval_secs)
    }

    /// Returns the near-due window.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::LookaheadOutOfRange`] when the value does not
    /// fit a [`TimeDelta`].
    pub fn lookahead(&self) -> Result<TimeDelta, ConfigError> {
        let seconds = self.sweep.lookahead_secs;
        i64::try_from(seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or(ConfigError::LookaheadOutOfRange(seconds))
    }

    /// Builds settings for the transition service.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOffset`] outside ±14 hours.
    pub fn transition_settings(&self) -> Result<TransitionSettings, ConfigError> {
        Ok(TransitionSettings::new(
            self.rules.clone(),
            self.local_offset()?,
        ))
    }

    /// Builds settings for the reminder sweep.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Sweep`] when no escalation stage is configured
    /// and [`ConfigError::LookaheadOutOfRange`] for an oversized window.
    pub fn sweep_settings(&self) -> Result<SweepSettings, ConfigError> {
        Ok(SweepSettings::from_rules(&self.rules, self.lookahead()?)?)
    }
}
