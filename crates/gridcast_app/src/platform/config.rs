use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gridcast_core::CoreSettings;
use gridcast_engine::{ApiSettings, EngineConfig, PollSettings, RetryPolicy};
use gridcast_logging::gc_info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::logging::LogDestination;

pub const CONFIG_FILENAME: &str = "gridcast.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_delay_ms: u64,
    pub multiplier: f64,
    pub max_consecutive_failures: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_delay_ms: policy.max_delay.as_millis() as u64,
            multiplier: policy.multiplier,
            max_consecutive_failures: policy.max_consecutive_failures,
        }
    }
}

/// Contents of `gridcast.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    pub poll_interval_ms: u64,
    pub notification_ttl_ms: u64,
    pub request_timeout_ms: u64,
    pub retry: RetryConfig,
    /// JSON file backing the local key-value store.
    pub state_file: PathBuf,
    pub log_destination: LogDestination,
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let api = ApiSettings::default();
        Self {
            server_url: api.base_url,
            poll_interval_ms: 3000,
            notification_ttl_ms: 5000,
            request_timeout_ms: api.request_timeout.as_millis() as u64,
            retry: RetryConfig::default(),
            state_file: PathBuf::from("gridcast_state.json"),
            log_destination: LogDestination::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    /// Reads the config at `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config = ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        gc_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn with_server(mut self, server_url: Option<String>) -> Self {
        if let Some(url) = server_url {
            self.server_url = url;
        }
        self
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            api: self.api_settings(),
            poll: PollSettings {
                interval: Duration::from_millis(self.poll_interval_ms),
                retry: RetryPolicy {
                    max_delay: Duration::from_millis(self.retry.max_delay_ms),
                    multiplier: self.retry.multiplier,
                    max_consecutive_failures: self.retry.max_consecutive_failures,
                },
            },
        }
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.server_url.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            ..ApiSettings::default()
        }
    }

    pub fn core_settings(&self) -> CoreSettings {
        CoreSettings {
            notification_ttl: Duration::from_millis(self.notification_ttl_ms),
        }
    }
}
