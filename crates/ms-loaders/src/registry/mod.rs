/*
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 */

//! Identifier registry: the canonical asset universe and its health.
//!
//! Records live in an in-memory arena ordered priority-first. Two indexes sit
//! on top of it:
//!
//! - lowercased symbol -> arena positions in snapshot order
//! - lowercased name -> first arena position
//!
//! so resolution keeps the first-match tie-break of a linear scan. Health
//! updates are written through the [`SnapshotStore`] before they return.

pub mod merge;
pub mod store;

pub use merge::{merge, ListingSource};
pub use store::{JsonFileStore, MemoryStore, SnapshotStore};

use crate::error::RegistryError;
use ms_core::{AssetRecord, AssetStatus};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Registry tuning
#[derive(Debug, Clone)]
pub struct RegistryConfig {
  /// Snapshot location
  pub path: PathBuf,

  /// Snapshots older than this are rebuilt on load
  pub ttl: Duration,

  /// Consecutive failures before an asset is marked inactive
  pub failure_threshold: u32,

  /// Size of the market-cap ranked prefix
  pub priority_limit: u32,
}

impl Default for RegistryConfig {
  fn default() -> Self {
    Self {
      path: PathBuf::from("coin_registry.json"),
      ttl: Duration::from_secs(24 * 60 * 60),
      failure_threshold: 3,
      priority_limit: 250,
    }
  }
}

impl RegistryConfig {
  pub fn with_path(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), ..Self::default() }
  }
}

/// Outcome of resolving a batch of free-text terms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
  /// Canonical ids, in term order
  pub resolved: Vec<String>,
  /// Terms with no matching symbol or name
  pub unresolved: Vec<String>,
}

pub struct Registry {
  config: RegistryConfig,
  store: Box<dyn SnapshotStore>,
  records: Vec<AssetRecord>,
  by_id: HashMap<String, usize>,
  by_symbol: HashMap<String, Vec<usize>>,
  by_name: HashMap<String, usize>,
}

impl Registry {
  /// Registry backed by the JSON snapshot at `config.path`. Nothing is read
  /// until [`Registry::load`].
  pub fn open(config: RegistryConfig) -> Self {
    let store = JsonFileStore::new(config.path.clone());
    Self::with_store(config, Box::new(store))
  }

  pub fn with_store(config: RegistryConfig, store: Box<dyn SnapshotStore>) -> Self {
    Self {
      config,
      store,
      records: Vec::new(),
      by_id: HashMap::new(),
      by_symbol: HashMap::new(),
      by_name: HashMap::new(),
    }
  }

  /// Use the local snapshot when it is fresh and non-empty, rebuild otherwise.
  ///
  /// Returns the number of known assets.
  pub async fn load(&mut self, source: &dyn ListingSource) -> usize {
    if let Some(records) = self.fresh_snapshot() {
      info!("Loaded {} coins from registry cache", records.len());
      self.replace(records);
      return self.len();
    }
    self.rebuild(source).await
  }

  /// Snapshot contents regardless of age; never touches the network.
  pub fn load_cached(&mut self) -> Result<usize, RegistryError> {
    let records = self.store.load()?.unwrap_or_default();
    self.replace(records);
    Ok(self.len())
  }

  fn fresh_snapshot(&self) -> Option<Vec<AssetRecord>> {
    let age = self.store.age()?;
    if age >= self.config.ttl {
      info!("Registry snapshot is {}h old, refreshing", age.as_secs() / 3600);
      return None;
    }
    match self.store.load() {
      Ok(Some(records)) if !records.is_empty() => Some(records),
      Ok(_) => None,
      Err(e) => {
        warn!("Registry snapshot unreadable, rebuilding: {}", e);
        None
      }
    }
  }

  /// Fetch both listings, merge them priority-first and persist.
  ///
  /// Either listing may fail on its own; with both gone the previous snapshot
  /// (or nothing) is kept. A failed write is logged, not returned.
  pub async fn rebuild(&mut self, source: &dyn ListingSource) -> usize {
    info!("Building coin registry...");

    let priority = match source.priority_listing(self.config.priority_limit).await {
      Ok(listing) => {
        info!("Fetched top {} coins by market cap", listing.len());
        Some(listing)
      }
      Err(e) => {
        warn!("Failed to fetch top coins: {}", e);
        None
      }
    };

    let full = match source.full_listing().await {
      Ok(listing) => {
        info!("Fetched {} total coins", listing.len());
        Some(listing)
      }
      Err(e) => {
        warn!("Failed to fetch full coin list: {}", e);
        None
      }
    };

    let previous = self.previous_snapshot();

    if priority.is_none() && full.is_none() {
      warn!("Both listings unavailable, keeping previous snapshot of {} coins", previous.len());
      self.replace(previous);
      return self.len();
    }

    let merged =
      merge(priority.as_deref().unwrap_or_default(), full.as_deref().unwrap_or_default(), &previous);
    // An empty listing must not overwrite known health state
    if merged.is_empty() && !previous.is_empty() {
      warn!("Listings returned no coins, keeping previous snapshot of {} coins", previous.len());
      self.replace(previous);
      return self.len();
    }
    self.replace(merged);

    match self.store.save(&self.records) {
      Ok(()) => info!("Registry saved with {} coins", self.len()),
      Err(e) => warn!("Failed to save registry: {}", e),
    }
    self.len()
  }

  fn previous_snapshot(&self) -> Vec<AssetRecord> {
    if !self.records.is_empty() {
      return self.records.clone();
    }
    match self.store.load() {
      Ok(records) => records.unwrap_or_default(),
      Err(e) => {
        warn!("Previous registry snapshot unreadable: {}", e);
        Vec::new()
      }
    }
  }

  fn replace(&mut self, records: Vec<AssetRecord>) {
    self.records = records;
    self.reindex();
  }

  fn reindex(&mut self) {
    self.by_id.clear();
    self.by_symbol.clear();
    self.by_name.clear();
    for (idx, record) in self.records.iter().enumerate() {
      self.by_id.entry(record.id.clone()).or_insert(idx);
      self.by_symbol.entry(record.symbol.to_lowercase()).or_default().push(idx);
      self.by_name.entry(record.name.to_lowercase()).or_insert(idx);
    }
  }

  /// Case-insensitive lookup: exact symbol first, then exact name.
  ///
  /// On ticker collisions the earliest record in snapshot order wins, which
  /// is the market-cap ranked one when it is in the priority prefix.
  pub fn resolve(&self, term: &str) -> Option<&str> {
    let key = term.trim().to_lowercase();
    if key.is_empty() {
      return None;
    }
    let idx = match self.by_symbol.get(&key).and_then(|hits| hits.first()) {
      Some(&idx) => idx,
      None => *self.by_name.get(&key)?,
    };
    Some(self.records[idx].id.as_str())
  }

  pub fn resolve_many<S: AsRef<str>>(&self, terms: &[S]) -> Resolution {
    let mut resolution = Resolution::default();
    for term in terms {
      let term = term.as_ref();
      match self.resolve(term) {
        Some(id) => {
          debug!("Resolved '{}' to '{}'", term, id);
          resolution.resolved.push(id.to_string());
        }
        None => {
          warn!("Could not resolve '{}'", term);
          resolution.unresolved.push(term.to_string());
        }
      }
    }
    resolution
  }

  /// Split ids into (active, inactive). Unknown ids count as active.
  pub fn filter_active(&self, ids: &[String]) -> (Vec<String>, Vec<String>) {
    ids.iter().cloned().partition(|id| self.get(id).map_or(true, AssetRecord::is_active))
  }

  /// Count a failed fetch for `id`; at the threshold the asset goes inactive.
  /// Unknown ids are ignored.
  pub fn record_failure(&mut self, id: &str) -> Result<(), RegistryError> {
    let Some(&idx) = self.by_id.get(id) else {
      debug!("Ignoring failure for unknown id '{}'", id);
      return Ok(());
    };
    let threshold = self.config.failure_threshold;
    let record = &mut self.records[idx];
    record.failure_count += 1;
    if record.failure_count >= threshold && record.is_active() {
      record.status = AssetStatus::Inactive;
      warn!("Marked '{}' inactive after {} failures", id, record.failure_count);
    }
    self.store.save(&self.records)
  }

  /// Clear the failure streak of `id`. Writes only when something changed.
  pub fn record_success(&mut self, id: &str) -> Result<(), RegistryError> {
    let Some(&idx) = self.by_id.get(id) else {
      return Ok(());
    };
    let record = &mut self.records[idx];
    if record.failure_count == 0 {
      return Ok(());
    }
    if !record.is_active() {
      info!("Reactivating '{}'", id);
    }
    record.failure_count = 0;
    record.status = AssetStatus::Active;
    self.store.save(&self.records)
  }

  /// Every record sharing `symbol`, in snapshot order.
  pub fn find_all(&self, symbol: &str) -> Vec<&AssetRecord> {
    self
      .by_symbol
      .get(&symbol.trim().to_lowercase())
      .map(|hits| hits.iter().map(|&idx| &self.records[idx]).collect())
      .unwrap_or_default()
  }

  /// First `n` ids in snapshot order.
  pub fn top(&self, n: usize) -> Vec<String> {
    self.records.iter().take(n).map(|r| r.id.clone()).collect()
  }

  pub fn get(&self, id: &str) -> Option<&AssetRecord> {
    self.by_id.get(id).map(|&idx| &self.records[idx])
  }

  pub fn records(&self) -> &[AssetRecord] {
    &self.records
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

}
