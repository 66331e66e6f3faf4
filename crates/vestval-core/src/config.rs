//! Runtime settings read from the environment.
//!
//! | Variable | Fallback | Default |
//! |----------|----------|---------|
//! | `VESTVAL_ALPHAVANTAGE_API_KEY` | `ALPHA_VANTAGE_API_KEY` | unset, adapter disabled |
//! | `VESTVAL_TIMEOUT_MS` | | `5000` |
//! | `VESTVAL_MAX_RETRIES` | | `2` |

use std::fmt::{Debug, Formatter};

use thiserror::Error;

use crate::http_client::DEFAULT_TIMEOUT_MS;

pub const ALPHAVANTAGE_KEY_VARS: [&str; 2] =
    ["VESTVAL_ALPHAVANTAGE_API_KEY", "ALPHA_VANTAGE_API_KEY"];
pub const TIMEOUT_VAR: &str = "VESTVAL_TIMEOUT_MS";
pub const MAX_RETRIES_VAR: &str = "VESTVAL_MAX_RETRIES";

pub const DEFAULT_MAX_RETRIES: u32 = 2;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{var} must be greater than zero")]
    Zero { var: &'static str },
}

#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub alphavantage_api_key: Option<String>,
    pub timeout_ms: u64,
    pub max_retries: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alphavantage_api_key: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl Debug for Settings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field(
                "alphavantage_api_key",
                &self.alphavantage_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("timeout_ms", &self.timeout_ms)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable lookup. Blank values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let alphavantage_api_key = ALPHAVANTAGE_KEY_VARS.into_iter().find_map(|name| get(name));

        let timeout_ms = match get(TIMEOUT_VAR) {
            Some(raw) => parse_number::<u64>(TIMEOUT_VAR, &raw)?,
            None => DEFAULT_TIMEOUT_MS,
        };
        if timeout_ms == 0 {
            return Err(ConfigError::Zero { var: TIMEOUT_VAR });
        }

        let max_retries = match get(MAX_RETRIES_VAR) {
            Some(raw) => parse_number::<u32>(MAX_RETRIES_VAR, &raw)?,
            None => DEFAULT_MAX_RETRIES,
        };

        Ok(Self {
            alphavantage_api_key,
            timeout_ms,
            max_retries,
        })
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse::<T>().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: raw.to_owned(),
    })
}
