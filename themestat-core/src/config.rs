use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

/// Configuration errors. Only raised at startup.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid server URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Access token is missing or empty")]
    MissingToken,
    #[error("{name} must be greater than zero")]
    InvalidInterval { name: &'static str },
}

/// Validated settings for talking to the media server and pacing refreshes.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_url: Url,
    pub token: String,
    pub update_interval: Duration,
    pub request_timeout: Duration,
}

impl Config {
    pub fn new(
        server_url: &str,
        token: &str,
        update_interval_secs: u64,
        request_timeout_secs: u64,
    ) -> Result<Self, ConfigError> {
        let trimmed = server_url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed).map_err(|e| ConfigError::InvalidUrl {
            url: server_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: server_url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let token = token.trim();
        if token.is_empty() {
            return Err(ConfigError::MissingToken);
        }

        if update_interval_secs == 0 {
            return Err(ConfigError::InvalidInterval {
                name: "update interval",
            });
        }
        if request_timeout_secs == 0 {
            return Err(ConfigError::InvalidInterval {
                name: "request timeout",
            });
        }

        Ok(Self {
            server_url: parsed,
            token: token.to_string(),
            update_interval: Duration::from_secs(update_interval_secs),
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }
}
