use std::time::Duration;

use thiserror::Error;

pub const ACTOR_BUFFER_VAR: &str = "FOODSTORE_ACTOR_BUFFER";
pub const REQUEST_TIMEOUT_VAR: &str = "FOODSTORE_REQUEST_TIMEOUT_MS";
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

const DEFAULT_ACTOR_BUFFER: usize = 32;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Runtime settings, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemConfig {
    /// Mailbox size of every resource actor.
    pub actor_buffer: usize,
    /// Default deadline for workflow operations; `None` disables it.
    pub request_timeout: Option<Duration>,
    /// Only consulted when built with the `postgres` feature.
    pub database_url: Option<String>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            actor_buffer: DEFAULT_ACTOR_BUFFER,
            request_timeout: Some(Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS)),
            database_url: None,
        }
    }
}

impl SystemConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the config from any variable source; unset variables take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let actor_buffer = match lookup(ACTOR_BUFFER_VAR) {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: ACTOR_BUFFER_VAR,
                        value,
                        expected: "a positive integer",
                    })
                }
            },
            None => DEFAULT_ACTOR_BUFFER,
        };

        let timeout_ms = match lookup(REQUEST_TIMEOUT_VAR) {
            Some(value) => value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                var: REQUEST_TIMEOUT_VAR,
                value,
                expected: "a number of milliseconds",
            })?,
            None => DEFAULT_REQUEST_TIMEOUT_MS,
        };
        let request_timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));

        let database_url = lookup(DATABASE_URL_VAR).filter(|url| !url.trim().is_empty());

        Ok(Self {
            actor_buffer,
            request_timeout,
            database_url,
        })
    }
}
