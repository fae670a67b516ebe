//! Service configuration from environment variables

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use validator::Validate;

pub const DATABASE_URL_ENV_VAR: &str = "DATABASE_URL";
pub const PORT_ENV_VAR: &str = "PORT";
pub const MAX_CONNECTIONS_ENV_VAR: &str = "DB_MAX_CONNECTIONS";
pub const REFRESH_INTERVAL_ENV_VAR: &str = "REFRESH_INTERVAL_SECS";
pub const PERSIST_FACTS_ENV_VAR: &str = "PERSIST_FACTS";
pub const NATS_URL_ENV_VAR: &str = "NATS_URL";
pub const NATS_SUBJECT_ENV_VAR: &str = "NATS_SUBJECT";

#[derive(Clone, Debug, Validate)]
pub struct Config {
    #[validate(length(min = 1))]
    pub database_url: String,
    #[validate(range(min = 1))]
    pub port: u16,
    #[validate(range(min = 1, max = 100))]
    pub max_connections: u32,
    /// Seconds between scheduled refreshes; 0 disables the scheduler.
    pub refresh_interval_secs: u64,
    pub persist_facts: bool,
    pub nats_url: Option<String>,
    #[validate(length(min = 1))]
    pub nats_subject: String,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> { Self::from_lookup(|key| std::env::var(key).ok()) }

    /// Builds the config from any key lookup; `from_env` uses the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = Self {
            database_url: lookup(DATABASE_URL_ENV_VAR).ok_or(ConfigError::Missing(DATABASE_URL_ENV_VAR))?,
            port: parse_or(&lookup, PORT_ENV_VAR, 8083)?,
            max_connections: parse_or(&lookup, MAX_CONNECTIONS_ENV_VAR, 10)?,
            refresh_interval_secs: parse_or(&lookup, REFRESH_INTERVAL_ENV_VAR, 300)?,
            persist_facts: parse_or(&lookup, PERSIST_FACTS_ENV_VAR, true)?,
            nats_url: lookup(NATS_URL_ENV_VAR).filter(|v| !v.trim().is_empty()),
            nats_subject: lookup(NATS_SUBJECT_ENV_VAR).unwrap_or_else(|| "sales_facts.refreshed".to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
