// ⚙️ Configuration - snapshot URLs, reference path, supply
//
// Deployment settings live in PipelineConfig and are handed to the pipeline
// explicitly.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Default location of the TP reference table
pub const DEFAULT_TP_REFERENCE_PATH: &str = "data/tp_reference.csv";

/// Default HTTP timeout for snapshot fetches
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Default number of rows requested per snapshot (single page)
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Default listen address for the web server
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub main_pool_url: String,
    pub market_pool_url: String,
    pub tp_reference_path: PathBuf,
    pub total_supply: f64,
    pub fetch_timeout: Duration,
    pub page_size: usize,
}

impl PipelineConfig {
    pub fn new(
        main_pool_url: impl Into<String>,
        market_pool_url: impl Into<String>,
        tp_reference_path: impl Into<PathBuf>,
        total_supply: f64,
    ) -> Self {
        PipelineConfig {
            main_pool_url: main_pool_url.into(),
            market_pool_url: market_pool_url.into(),
            tp_reference_path: tp_reference_path.into(),
            total_supply,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Load from environment variables (`.env` is read by the binaries)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from any key → value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let main_pool_url = required("MAIN_POOL_URL")?;
        let market_pool_url = required("MARKET_POOL_URL")?;

        let raw_supply = required("TOTAL_SUPPLY")?;
        let total_supply = raw_supply
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or(ConfigError::Invalid {
                key: "TOTAL_SUPPLY",
                value: raw_supply.clone(),
            })?;

        let tp_reference_path = lookup("TP_REFERENCE_PATH")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TP_REFERENCE_PATH.to_string());

        let fetch_timeout_secs = parse_optional(&lookup, "FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS)?;
        let page_size = parse_optional(&lookup, "PAGE_SIZE", DEFAULT_PAGE_SIZE)?;

        Ok(PipelineConfig {
            main_pool_url,
            market_pool_url,
            tp_reference_path: PathBuf::from(tp_reference_path),
            total_supply,
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            page_size,
        })
    }

    /// Snapshot URL for a pool with the page-size bound applied
    pub fn snapshot_url(&self, base: &str) -> String {
        let separator = if base.contains('?') { '&' } else { '?' };
        format!("{}{}limit={}", base, separator, self.page_size)
    }
}

fn parse_optional<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key).map(|v| v.trim().to_string()) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => v.parse::<T>().map_err(|_| ConfigError::Invalid { key, value: v }),
    }
}

/// Server listen address (`BIND_ADDR`)
pub fn bind_addr() -> String {
    env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("MAIN_POOL_URL", "https://example.test/main"),
        ("MARKET_POOL_URL", "https://example.test/market"),
        ("TOTAL_SUPPLY", "1000000"),
    ];

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::from_lookup(lookup(REQUIRED)).unwrap();

        assert_eq!(config.main_pool_url, "https://example.test/main");
        assert_eq!(config.total_supply, 1_000_000.0);
        assert_eq!(config.tp_reference_path, PathBuf::from(DEFAULT_TP_REFERENCE_PATH));
        assert_eq!(config.fetch_timeout, Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS));
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("TP_REFERENCE_PATH", "/srv/tp.csv"));
        pairs.push(("FETCH_TIMEOUT_SECS", "5"));
        pairs.push(("PAGE_SIZE", "50"));

        let config = PipelineConfig::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(config.tp_reference_path, PathBuf::from("/srv/tp.csv"));
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.page_size, 50);
    }

    #[test]
    fn test_missing_required() {
        let result = PipelineConfig::from_lookup(lookup(&REQUIRED[..2]));
        assert!(matches!(result, Err(ConfigError::Missing("TOTAL_SUPPLY"))));

        let result = PipelineConfig::from_lookup(lookup(&[("MAIN_POOL_URL", "  ")]));
        assert!(matches!(result, Err(ConfigError::Missing("MAIN_POOL_URL"))));
    }

    #[test]
    fn test_invalid_values() {
        let mut pairs = REQUIRED[..2].to_vec();
        pairs.push(("TOTAL_SUPPLY", "lots"));
        let result = PipelineConfig::from_lookup(lookup(&pairs));
        assert!(matches!(result, Err(ConfigError::Invalid { key: "TOTAL_SUPPLY", .. })));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PAGE_SIZE", "-1"));
        let result = PipelineConfig::from_lookup(lookup(&pairs));
        assert!(matches!(result, Err(ConfigError::Invalid { key: "PAGE_SIZE", .. })));
    }

    #[test]
    fn test_snapshot_url() {
        let mut config = PipelineConfig::new("a", "b", "c.csv", 1.0);
        config.page_size = 25;

        assert_eq!(config.snapshot_url("https://x.test/holdings"), "https://x.test/holdings?limit=25");
        assert_eq!(config.snapshot_url("https://x.test/h?chain=1"), "https://x.test/h?chain=1&limit=25");
    }
}
