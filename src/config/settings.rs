//! Client configuration settings
//!
//! Per-client timing policy and logging configuration, with environment loading

use crate::utils::error::{helpers::config_error, ApiResult};
use crate::utils::rational::Rational;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing and addressing policy of one configured client type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Path segment between the base URL and every operation
    #[serde(default)]
    pub suffix: Option<String>,

    /// Reuse one persistent connection across calls
    #[serde(default = "default_true")]
    pub keep_alive: bool,

    /// Steady request rate, `[requests, seconds]` in JSON
    #[serde(default)]
    pub requests_per_sec: Option<Rational>,

    /// Per-attempt timeout
    #[serde(default = "default_request_timeout_sec")]
    pub request_timeout_sec: f64,

    /// Retries after the first attempt times out
    #[serde(default = "default_attempts_after_timeout")]
    pub attempts_after_timeout: u32,

    /// Fixed pause before each retry
    #[serde(default = "default_delay_before_attempt_sec")]
    pub delay_before_attempt_sec: f64,

    /// Name under which the base URL is supplied at instantiation
    #[serde(default = "default_rename_base_field")]
    pub rename_base_field: String,
}

fn default_true() -> bool {
    true
}

fn default_request_timeout_sec() -> f64 {
    5.0
}

fn default_attempts_after_timeout() -> u32 {
    10
}

fn default_delay_before_attempt_sec() -> f64 {
    5.0
}

fn default_rename_base_field() -> String {
    "url".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            suffix: None,
            keep_alive: default_true(),
            requests_per_sec: None,
            request_timeout_sec: default_request_timeout_sec(),
            attempts_after_timeout: default_attempts_after_timeout(),
            delay_before_attempt_sec: default_delay_before_attempt_sec(),
            rename_base_field: default_rename_base_field(),
        }
    }
}

impl ClientConfig {
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn requests_per_sec(mut self, rate: Rational) -> Self {
        self.requests_per_sec = Some(rate);
        self
    }

    pub fn request_timeout_sec(mut self, seconds: f64) -> Self {
        self.request_timeout_sec = seconds;
        self
    }

    pub fn attempts_after_timeout(mut self, attempts: u32) -> Self {
        self.attempts_after_timeout = attempts;
        self
    }

    pub fn delay_before_attempt_sec(mut self, seconds: f64) -> Self {
        self.delay_before_attempt_sec = seconds;
        self
    }

    pub fn rename_base_field(mut self, field: impl Into<String>) -> Self {
        self.rename_base_field = field.into();
        self
    }

    /// Load configuration from `<PREFIX>_*` environment variables
    ///
    /// Unset variables keep their defaults. A `.env` file is read first if present.
    pub fn from_env(prefix: &str) -> Result<Self> {
        dotenv::dotenv().ok();

        let defaults = Self::default();
        let var = |name: &str| std::env::var(format!("{}_{}", prefix, name)).ok();

        let config = Self {
            suffix: var("SUFFIX").filter(|s| !s.is_empty()),
            keep_alive: match var("KEEP_ALIVE") {
                Some(v) => v.parse().context("Invalid keep-alive flag")?,
                None => defaults.keep_alive,
            },
            requests_per_sec: match var("REQUESTS_PER_SEC") {
                Some(v) if !v.trim().is_empty() => {
                    Some(v.parse::<Rational>().context("Invalid requests per second")?)
                }
                _ => None,
            },
            request_timeout_sec: match var("REQUEST_TIMEOUT_SEC") {
                Some(v) => v.parse().context("Invalid request timeout")?,
                None => defaults.request_timeout_sec,
            },
            attempts_after_timeout: match var("ATTEMPTS_AFTER_TIMEOUT") {
                Some(v) => v.parse().context("Invalid attempts after timeout")?,
                None => defaults.attempts_after_timeout,
            },
            delay_before_attempt_sec: match var("DELAY_BEFORE_ATTEMPT_SEC") {
                Some(v) => v.parse().context("Invalid delay before attempt")?,
                None => defaults.delay_before_attempt_sec,
            },
            rename_base_field: var("RENAME_BASE_FIELD").unwrap_or(defaults.rename_base_field),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration validity
    pub fn validate(&self) -> ApiResult<()> {
        if let Some(rate) = self.requests_per_sec {
            if !rate.is_positive() {
                return Err(config_error(format!(
                    "requests_per_sec must be positive, got {}",
                    rate
                )));
            }
            // Keeps exact token arithmetic far from i128 overflow
            let limit = i128::from(u32::MAX);
            if rate.numer() > limit || rate.denom() > limit {
                return Err(config_error(format!(
                    "requests_per_sec terms must fit in 32 bits, got {}",
                    rate
                )));
            }
        }

        if !self.request_timeout_sec.is_finite() || self.request_timeout_sec <= 0.0 {
            return Err(config_error(format!(
                "request_timeout_sec must be a positive number, got {}",
                self.request_timeout_sec
            )));
        }

        if !self.delay_before_attempt_sec.is_finite() || self.delay_before_attempt_sec < 0.0 {
            return Err(config_error(format!(
                "delay_before_attempt_sec cannot be negative, got {}",
                self.delay_before_attempt_sec
            )));
        }

        if self.rename_base_field.trim().is_empty() {
            return Err(config_error("rename_base_field cannot be empty"));
        }

        Ok(())
    }

    /// Per-attempt timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.request_timeout_sec).unwrap_or(Duration::ZERO)
    }

    /// Pause before each retry
    pub fn retry_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_before_attempt_sec).unwrap_or(Duration::ZERO)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive
    pub level: String,
    /// Log format (text/json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Read `RUST_LOG` and `LOG_FORMAT`
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let config = Self {
            level: get_env_or_default("RUST_LOG", "info"),
            format: get_env_or_default("LOG_FORMAT", "text"),
        };
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.level.trim().is_empty() {
            anyhow::bail!("Log level cannot be empty");
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.format.as_str()) {
            anyhow::bail!("Invalid log format: {}", self.format);
        }

        Ok(())
    }

    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

/// Get environment variable or default value
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
