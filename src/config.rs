use std::time::Duration;

use thiserror::Error;

pub const API_URL_VAR: &str = "MONOPOLY_API_URL";
pub const API_TOKEN_VAR: &str = "MONOPOLY_API_TOKEN";
pub const HTTP_TIMEOUT_VAR: &str = "MONOPOLY_HTTP_TIMEOUT_SECS";
pub const POLL_INTERVAL_VAR: &str = "MONOPOLY_POLL_INTERVAL_SECS";

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{var} must be a positive number of seconds, got {value:?}")]
    InvalidSeconds { var: &'static str, value: String },
}

/// Connection settings for the game API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub http_timeout: Duration,
    pub poll_interval: Duration,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            token: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Reads the process environment after loading a `.env` file if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_url = read(API_URL_VAR).ok_or(ConfigError::Missing(API_URL_VAR))?;
        let mut config = Self::new(api_url.trim());
        config.token = read(API_TOKEN_VAR);
        if let Some(value) = read(HTTP_TIMEOUT_VAR) {
            config.http_timeout = parse_seconds(HTTP_TIMEOUT_VAR, &value)?;
        }
        if let Some(value) = read(POLL_INTERVAL_VAR) {
            config.poll_interval = parse_seconds(POLL_INTERVAL_VAR, &value)?;
        }
        Ok(config)
    }
}

fn parse_seconds(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidSeconds {
            var,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_url_is_set() {
        let config = ClientConfig::from_lookup(lookup(&[(API_URL_VAR, "http://localhost:3000/api")]))
            .unwrap();
        assert_eq!(config, ClientConfig::new("http://localhost:3000/api"));
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.http_timeout, Duration::from_secs(15));
    }

    #[test]
    fn overrides_are_read() {
        let config = ClientConfig::from_lookup(lookup(&[
            (API_URL_VAR, "https://api.example.org"),
            (API_TOKEN_VAR, "secret"),
            (HTTP_TIMEOUT_VAR, "30"),
            (POLL_INTERVAL_VAR, " 2 "),
        ]))
        .unwrap();
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn missing_url_and_bad_seconds_are_rejected() {
        assert_eq!(
            ClientConfig::from_lookup(lookup(&[(API_URL_VAR, "  ")])),
            Err(ConfigError::Missing(API_URL_VAR))
        );
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[
                (API_URL_VAR, "http://x"),
                (POLL_INTERVAL_VAR, "0"),
            ])),
            Err(ConfigError::InvalidSeconds { var: POLL_INTERVAL_VAR, .. })
        ));
    }
}
