//! Station configuration
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `WEATHER_STATION_*` environment variables. Command line flags are applied
//! on top by the binary.

use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

/// Prefix for environment overrides, e.g. `WEATHER_STATION_PORT=4224`
pub const ENV_PREFIX: &str = "WEATHER_STATION_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::Invalid(Box::new(e))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Bridge daemon host
    pub host: String,
    /// Bridge daemon port
    pub port: u16,
    /// Pause between connect/enumerate attempts
    pub retry_delay_ms: u64,
    /// Give up after this many attempts; unset retries forever
    pub max_retries: Option<u32>,
    /// Sensor callback period
    pub callback_period_ms: u32,
    /// How long a device call waits for its response
    pub request_timeout_ms: u64,
    /// Reconnect on our own after the bridge connection drops
    pub auto_reconnect: bool,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 4223,
            retry_delay_ms: 1000,
            max_retries: None,
            callback_period_ms: 1000,
            request_timeout_ms: 2500,
            auto_reconnect: true,
        }
    }
}

impl StationConfig {
    /// Layered provider for a config file path. A missing file is skipped.
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(StationConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Ok(Self::figment(path).extract()?)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let delay = Duration::from_millis(self.retry_delay_ms);
        match self.max_retries {
            Some(max) => RetryPolicy::bounded(delay, max),
            None => RetryPolicy::forever(delay),
        }
    }

    pub fn connection_config(&self) -> tfp::ConnectionConfig {
        tfp::ConnectionConfig {
            timeout: Duration::from_millis(self.request_timeout_ms),
            auto_reconnect: self.auto_reconnect,
            ..tfp::ConnectionConfig::default()
        }
    }
}
