use crate::error::{EngineError, Result};
use connectors::SqliteOptions;
use serde::Deserialize;
use std::{path::Path, str::FromStr};

pub const ENV_RETRY_MAX_ATTEMPTS: &str = "FILTERC_RETRY_MAX_ATTEMPTS";
pub const ENV_RETRY_BASE_DELAY_MS: &str = "FILTERC_RETRY_BASE_DELAY_MS";
pub const ENV_RETRY_MAX_DELAY_MS: &str = "FILTERC_RETRY_MAX_DELAY_MS";
pub const ENV_LOG_PREDICATES: &str = "FILTERC_LOG_PREDICATES";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 50,
            max_delay_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub retry: RetryConfig,
    /// Log every compiled predicate at debug level.
    pub log_predicates: bool,
    pub sqlite: SqliteOptions,
}

impl EngineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))
    }

    /// Overrides settings from the process environment.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Overrides settings from `lookup`, keyed by the `FILTERC_*` names.
    pub fn apply_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(v) = parse_var(&lookup, ENV_RETRY_MAX_ATTEMPTS)? {
            self.retry.max_attempts = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_RETRY_BASE_DELAY_MS)? {
            self.retry.base_delay_ms = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_RETRY_MAX_DELAY_MS)? {
            self.retry.max_delay_ms = v;
        }
        if let Some(raw) = lookup(ENV_LOG_PREDICATES) {
            self.log_predicates = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                other => {
                    return Err(EngineError::Config(format!(
                        "{ENV_LOG_PREDICATES}: expected a boolean, got `{other}`"
                    )));
                }
            };
        }
        Ok(self)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| EngineError::Config(format!("{key}: {e}")))
        })
        .transpose()
}
