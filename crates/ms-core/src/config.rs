//! Configuration management for the CoinGecko client and registry paths

use crate::error::{Error, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;

/// Main configuration struct shared by the client and loaders
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
  /// CoinGecko API key (optional on the demo tier)
  pub api_key: Option<String>,

  /// Whether the key belongs to a paid plan
  pub is_pro: bool,

  /// API root, demo or pro unless overridden
  pub base_url: String,

  /// API rate limit (requests per minute)
  pub rate_limit: u32,

  /// Request timeout in seconds
  pub timeout_secs: u64,

  /// Location of the registry snapshot
  pub registry_file: String,

  /// Location of the run-duration side file
  pub usage_log_file: String,
}

impl Config {
  /// Load configuration from environment variables
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let api_key = env::var("COINGECKO_API_KEY").ok().filter(|k| !k.trim().is_empty());

    let is_pro = env::var("COINGECKO_IS_PRO")
      .map(|v| v.trim().eq_ignore_ascii_case("true"))
      .unwrap_or(false);

    let base_url = env::var("COINGECKO_BASE_URL").unwrap_or_else(|_| {
      if is_pro { crate::COINGECKO_PRO_BASE_URL } else { crate::COINGECKO_DEMO_BASE_URL }
        .to_string()
    });
    url::Url::parse(&base_url)
      .map_err(|e| Error::Config(format!("Invalid COINGECKO_BASE_URL: {}", e)))?;

    let default_rate = if is_pro { crate::PRO_RATE_LIMIT } else { crate::DEMO_RATE_LIMIT };
    let rate_limit = env::var("MS_RATE_LIMIT")
      .unwrap_or_else(|_| default_rate.to_string())
      .parse()
      .map_err(|_| Error::Config("Invalid MS_RATE_LIMIT".to_string()))?;

    let timeout_secs = env::var("MS_TIMEOUT_SECS")
      .unwrap_or_else(|_| "10".to_string())
      .parse()
      .map_err(|_| Error::Config("Invalid MS_TIMEOUT_SECS".to_string()))?;

    let registry_file =
      env::var("MS_REGISTRY_FILE").unwrap_or_else(|_| "coin_registry.json".to_string());
    let usage_log_file =
      env::var("MS_USAGE_LOG_FILE").unwrap_or_else(|_| "usage_log.json".to_string());

    Ok(Config { api_key, is_pro, base_url, rate_limit, timeout_secs, registry_file, usage_log_file })
  }

  /// Create a demo-tier config pointing at `base_url` (for testing)
  pub fn for_base_url(base_url: impl Into<String>) -> Self {
    Config {
      api_key: None,
      is_pro: false,
      base_url: base_url.into(),
      rate_limit: crate::DEMO_RATE_LIMIT,
      timeout_secs: 10,
      registry_file: "coin_registry.json".to_string(),
      usage_log_file: "usage_log.json".to_string(),
    }
  }

  /// Header name and value used to authenticate, if a key is configured.
  pub fn auth_header(&self) -> Option<(&'static str, &str)> {
    let key = self.api_key.as_deref()?;
    let header = if self.is_pro { crate::PRO_API_KEY_HEADER } else { crate::DEMO_API_KEY_HEADER };
    Some((header, key))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  fn clear_env() {
    for var in [
      "COINGECKO_API_KEY",
      "COINGECKO_IS_PRO",
      "COINGECKO_BASE_URL",
      "MS_RATE_LIMIT",
      "MS_TIMEOUT_SECS",
      "MS_REGISTRY_FILE",
      "MS_USAGE_LOG_FILE",
    ] {
      env::remove_var(var);
    }
  }

  #[test]
  #[serial]
  fn test_config_defaults_to_demo_tier() {
    clear_env();
    let config = Config::from_env().unwrap();
    assert!(!config.is_pro);
    assert_eq!(config.base_url, crate::COINGECKO_DEMO_BASE_URL);
    assert_eq!(config.rate_limit, crate::DEMO_RATE_LIMIT);
    assert_eq!(config.timeout_secs, 10);
    assert!(config.auth_header().is_none());
  }

  #[test]
  #[serial]
  fn test_config_pro_key_selects_pro_header() {
    clear_env();
    env::set_var("COINGECKO_API_KEY", "CG-secret");
    env::set_var("COINGECKO_IS_PRO", "TRUE");
    let config = Config::from_env().unwrap();
    assert_eq!(config.base_url, crate::COINGECKO_PRO_BASE_URL);
    assert_eq!(config.auth_header(), Some((crate::PRO_API_KEY_HEADER, "CG-secret")));
    clear_env();
  }

  #[test]
  #[serial]
  fn test_config_rejects_bad_timeout() {
    clear_env();
    env::set_var("MS_TIMEOUT_SECS", "soon");
    assert!(matches!(Config::from_env(), Err(Error::Config(_))));
    clear_env();
  }
}
