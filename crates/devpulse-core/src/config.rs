use std::env;
use std::time::Duration;

use chrono::TimeDelta;
use thiserror::Error;

pub const ONLINE_TIMEOUT_ENV: &str = "HEALTH_MAX_TIMEOUT";
pub const DEFAULT_ONLINE_TIMEOUT_MS: u64 = 300_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
    #[error("online timeout of {0:?} does not fit in signed milliseconds")]
    TimeoutOutOfRange(Duration),
}

/// Threshold settings shared by the reconstructor and the evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineConfig {
    /// Longest silence still counted as continuous uptime.
    pub online_timeout: Duration,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            online_timeout: Duration::from_millis(DEFAULT_ONLINE_TIMEOUT_MS),
        }
    }
}

impl TimelineConfig {
    pub fn with_timeout_ms(ms: u64) -> Self {
        Self {
            online_timeout: Duration::from_millis(ms),
        }
    }

    /// Reads `HEALTH_MAX_TIMEOUT` (milliseconds), falling back to the default
    /// when the variable is unset or blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = match lookup(ONLINE_TIMEOUT_ENV) {
            Some(raw) if !raw.trim().is_empty() => {
                let ms = raw.trim().parse::<u64>().map_err(|_| {
                    ConfigError::Invalid(ONLINE_TIMEOUT_ENV.to_string(), raw.clone())
                })?;
                Self::with_timeout_ms(ms)
            }
            _ => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timeout_ms().map(|_| ())
    }

    pub(crate) fn timeout_ms(&self) -> Result<i64, ConfigError> {
        i64::try_from(self.online_timeout.as_millis())
            .map_err(|_| ConfigError::TimeoutOutOfRange(self.online_timeout))
    }

    /// Saturates at `TimeDelta::MAX` for an unvalidated config.
    pub(crate) fn timeout_delta(&self) -> TimeDelta {
        TimeDelta::from_std(self.online_timeout).unwrap_or(TimeDelta::MAX)
    }
}
