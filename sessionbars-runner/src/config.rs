//! Generation configuration loaded from TOML.
//!
//! Every section is optional; missing keys take their defaults.
//!
//! ```toml
//! [session]
//! time_zone = "America/New_York"
//! start = "08:00"
//! end = "16:00"
//!
//! [indicators]
//! ema_fast = 12
//! ema_slow = 26
//!
//! [output]
//! decimals = 3
//! version = 0
//!
//! [runner]
//! workers = 4
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sessionbars_core::{ClockError, EngineError, IndicatorConfig, SessionClock, SessionConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid session window: {0}")]
    Session(#[from] ClockError),

    #[error(transparent)]
    Indicators(#[from] EngineError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Output formatting and file versioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Decimal places for prices and indicators.
    pub decimals: usize,
    /// Output file format version, written as `vNNN` in file names.
    pub version: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            decimals: 3,
            version: 0,
        }
    }
}

/// Batch execution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Upper bound on concurrently processed sessions.
    pub workers: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

/// Full configuration for a generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub session: SessionConfig,
    pub indicators: IndicatorConfig,
    pub output: OutputConfig,
    pub runner: RunnerConfig,
}

impl GenerationConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that both regular and early-close sessions can be computed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Anchors are date independent; any weekday works as a probe.
        let probe = NaiveDate::from_ymd_opt(2024, 1, 2)
            .ok_or_else(|| ConfigError::Invalid("probe date".into()))?;
        for clock in [
            SessionClock::new(probe, &self.session)?,
            SessionClock::early_close(probe, &self.session)?,
        ] {
            self.indicators.validate_against(clock.anchors())?;
        }

        if self.runner.workers == 0 {
            return Err(ConfigError::Invalid("runner.workers must be >= 1".into()));
        }
        if self.output.decimals > 12 {
            return Err(ConfigError::Invalid(format!(
                "output.decimals must be <= 12, got {}",
                self.output.decimals
            )));
        }
        if self.output.version > 999 {
            return Err(ConfigError::Invalid(format!(
                "output.version must fit in three digits, got {}",
                self.output.version
            )));
        }
        Ok(())
    }
}
