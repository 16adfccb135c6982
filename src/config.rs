use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::coordinator::DEFAULT_PART_CONCURRENCY;
use crate::core::{DEFAULT_MULTIPART_THRESHOLD, DEFAULT_PART_SIZE, ThresholdPolicy};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Can't read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Can't parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid endpoint {endpoint:?}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        source: url::ParseError,
    },

    #[error("multipart_threshold ({threshold}) must not be smaller than part_size ({part_size})")]
    InvalidPolicy { threshold: u64, part_size: u64 },
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    /// Base URL of the backend issuing presigned URLs.
    pub endpoint: String,
    /// Sent as a bearer token on every backend call.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_multipart_threshold")]
    pub multipart_threshold: u64,
    #[serde(default = "default_part_size")]
    pub part_size: u64,
    #[serde(default = "default_part_concurrency")]
    pub part_concurrency: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_multipart_threshold() -> u64 {
    DEFAULT_MULTIPART_THRESHOLD
}

fn default_part_size() -> u64 {
    DEFAULT_PART_SIZE
}

fn default_part_concurrency() -> usize {
    DEFAULT_PART_CONCURRENCY
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Config {
    pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let config_str = fs::read_to_string(path)?;
        Config::from_toml(&config_str)
    }

    pub fn from_toml(config_str: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(config_str)?;
        Url::parse(&config.endpoint).map_err(|source| ConfigError::InvalidEndpoint {
            endpoint: config.endpoint.clone(),
            source,
        })?;

        // Anything above the threshold has to split into at least two parts.
        let part_size = config.part_size.max(1);
        if config.multipart_threshold < part_size {
            return Err(ConfigError::InvalidPolicy {
                threshold: config.multipart_threshold,
                part_size,
            });
        }

        Ok(config)
    }

    pub fn policy(&self) -> ThresholdPolicy {
        ThresholdPolicy::new(self.multipart_threshold, self.part_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = Config::from_toml(r#"endpoint = "https://api.example.com""#).unwrap();
        assert_eq!(config.multipart_threshold, DEFAULT_MULTIPART_THRESHOLD);
        assert_eq!(config.part_size, DEFAULT_PART_SIZE);
        assert_eq!(config.part_concurrency, DEFAULT_PART_CONCURRENCY);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_toml(
            r#"
            endpoint = "https://api.example.com/v1"
            token = "secret"
            multipart_threshold = 1024
            part_size = 512
            part_concurrency = 2
            "#,
        )
        .unwrap();

        let policy = config.policy();
        assert_eq!(policy.threshold(), 1024);
        assert_eq!(policy.part_size(), 512);
        assert_eq!(config.token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        let err = Config::from_toml(r#"endpoint = "nope""#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));

        assert!(matches!(Config::from_toml("endpoint = 3"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_rejects_threshold_below_part_size() {
        let err = Config::from_toml(
            r#"
            endpoint = "https://api.example.com"
            multipart_threshold = 1024
            part_size = 5242880
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidPolicy { threshold: 1024, part_size: 5242880 }
        ));

        let zero = Config::from_toml(
            r#"
            endpoint = "https://api.example.com"
            multipart_threshold = 0
            part_size = 0
            "#,
        );
        assert!(matches!(zero, Err(ConfigError::InvalidPolicy { part_size: 1, .. })));
    }

    #[test]
    fn test_threshold_plus_one_splits_in_two() {
        let config = Config::from_toml(
            r#"
            endpoint = "https://api.example.com"
            multipart_threshold = 100
            part_size = 100
            "#,
        )
        .unwrap();

        let plan = config.policy().plan(101);
        assert_eq!(plan.mode(), crate::core::TransportMode::Multipart);
        assert_eq!(plan.part_count(), 2);
    }
}
