use anyhow::{Context, Result};
use clap::ValueEnum;
use ms_database_postgres::RetentionConfig;
use ms_loaders::RegistryConfig;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
  pub api: ms_core::Config,
  /// Only required when rows are written
  pub database_url: Option<String>,
  pub registry: RegistryConfig,
  pub retention: RetentionConfig,
  pub usage_log_file: PathBuf,
}

impl Config {
  pub fn from_env() -> Result<Self> {
    let api = ms_core::Config::from_env().context("Failed to load CoinGecko configuration")?;

    let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty());

    let retention_days = env::var("MS_RETENTION_DAYS")
      .unwrap_or_else(|_| "60".to_string())
      .parse::<i64>()
      .context("MS_RETENTION_DAYS must be a whole number of days")?;

    let registry = RegistryConfig::with_path(&api.registry_file);
    let usage_log_file = PathBuf::from(&api.usage_log_file);

    Ok(Self {
      api,
      database_url,
      registry,
      retention: RetentionConfig { days: retention_days, ..RetentionConfig::default() },
      usage_log_file,
    })
  }

  pub fn require_database_url(&self) -> Result<&str> {
    self.database_url.as_deref().context("DATABASE_URL environment variable not set")
  }
}

/// Whether an ingestion run writes to the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
  #[default]
  Ingest,
  DryRun,
}

impl std::fmt::Display for Mode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Mode::Ingest => write!(f, "ingest"),
      Mode::DryRun => write!(f, "dry-run"),
    }
  }
}

/// Defaults for `ingest` read from `ingest_config.json`; flags win.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IngestDefaults {
  pub mode: Mode,
  pub limit: usize,
  /// Comma-separated symbols or names
  pub targets: Option<String>,
}

impl Default for IngestDefaults {
  fn default() -> Self {
    Self { mode: Mode::Ingest, limit: 500, targets: None }
  }
}

impl IngestDefaults {
  /// A missing file gives the built-in defaults; an unreadable one is
  /// reported and ignored.
  pub fn load(path: &Path) -> Self {
    if !path.exists() {
      return Self::default();
    }
    let parsed = std::fs::read_to_string(path)
      .map_err(anyhow::Error::from)
      .and_then(|content| serde_json::from_str::<Self>(&content).map_err(anyhow::Error::from));
    match parsed {
      Ok(defaults) => defaults,
      Err(e) => {
        warn!("Could not load {}: {}", path.display(), e);
        Self::default()
      }
    }
  }
}
