//! Runtime configuration
//!
//! Settings come from environment variables. Lookups go through a function so
//! tests can supply their own values instead of touching the process
//! environment.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::cache::CacheConfig;
use crate::data::gemini::{DEFAULT_MODEL, GEMINI_BASE_URL};

/// Environment variables checked for the API key, in order
const API_KEY_VARS: &[&str] = &["FARMACHECK_API_KEY", "GEMINI_API_KEY", "API_KEY"];

const MODEL_VAR: &str = "FARMACHECK_MODEL";
const API_BASE_VAR: &str = "FARMACHECK_API_BASE";
const CACHE_TTL_VAR: &str = "FARMACHECK_CACHE_TTL_SECS";
const CACHE_MAX_ENTRIES_VAR: &str = "FARMACHECK_CACHE_MAX_ENTRIES";
const DATA_DIR_VAR: &str = "FARMACHECK_DATA_DIR";

/// Error types for configuration loading
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set to something that does not parse
    #[error("Invalid value for {var}: '{value}'")]
    InvalidValue { var: &'static str, value: String },
}

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Gemini API key, if one was provided
    pub api_key: Option<String>,
    /// Gemini model name
    pub model: String,
    /// Gemini API base URL
    pub api_base: String,
    /// Result cache settings
    pub cache: CacheConfig,
    /// Override for the session data directory
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: GEMINI_BASE_URL.to_string(),
            cache: CacheConfig::default(),
            data_dir: None,
        }
    }
}

impl Config {
    /// Loads configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Loads configuration using `lookup` to read variables
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Config {
            api_key: API_KEY_VARS.iter().find_map(|&var| get(var)),
            ..Config::default()
        };

        if let Some(model) = get(MODEL_VAR) {
            config.model = model;
        }
        if let Some(base) = get(API_BASE_VAR) {
            config.api_base = base;
        }
        if let Some(secs) = get(CACHE_TTL_VAR) {
            let secs = parse_number::<u64>(CACHE_TTL_VAR, secs)?;
            config.cache = config.cache.with_ttl(Duration::from_secs(secs));
        }
        if let Some(max) = get(CACHE_MAX_ENTRIES_VAR) {
            let max = parse_number::<usize>(CACHE_MAX_ENTRIES_VAR, max)?;
            config.cache = config.cache.with_max_entries(max);
        }
        config.data_dir = get(DATA_DIR_VAR).map(PathBuf::from);

        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidValue { var, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| map.get(var).cloned())
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = load(&[]).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.cache.ttl, Duration::from_secs(900));
        assert_eq!(config.cache.max_entries, 200);
    }

    #[test]
    fn test_api_key_precedence() {
        let config = load(&[("API_KEY", "generic"), ("GEMINI_API_KEY", "gemini")]).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("gemini"));

        let config = load(&[("FARMACHECK_API_KEY", "own"), ("GEMINI_API_KEY", "gemini")]).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("own"));
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let config = load(&[("FARMACHECK_API_KEY", "  "), ("FARMACHECK_MODEL", "")]).unwrap();

        assert!(config.api_key.is_none());
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_cache_overrides() {
        let config = load(&[
            ("FARMACHECK_CACHE_TTL_SECS", "60"),
            ("FARMACHECK_CACHE_MAX_ENTRIES", "0"),
            ("FARMACHECK_DATA_DIR", "/tmp/farmacheck"),
        ])
        .unwrap();

        assert_eq!(config.cache.ttl, Duration::from_secs(60));
        assert_eq!(config.cache.max_entries, 1);
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/farmacheck")));
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let err = load(&[("FARMACHECK_CACHE_TTL_SECS", "quince")]).unwrap_err();

        assert_eq!(
            err,
            ConfigError::InvalidValue {
                var: "FARMACHECK_CACHE_TTL_SECS",
                value: "quince".to_string()
            }
        );
        assert!(err.to_string().contains("FARMACHECK_CACHE_TTL_SECS"));
    }
}
