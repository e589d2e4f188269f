/*
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 */

//! Snapshot persistence for the registry.

use crate::error::RegistryError;
use ms_core::AssetRecord;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Where the registry snapshot lives between runs.
pub trait SnapshotStore: Send + Sync {
  /// `Ok(None)` when no snapshot has been written yet.
  fn load(&self) -> Result<Option<Vec<AssetRecord>>, RegistryError>;

  /// Replace the snapshot. Readers never observe a partial write.
  fn save(&self, records: &[AssetRecord]) -> Result<(), RegistryError>;

  /// Time since the last write, `None` when unknown or absent.
  fn age(&self) -> Option<Duration>;
}

/// JSON array on disk, written through a sibling temp file and a rename.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
  path: PathBuf,
}

impl JsonFileStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn temp_path(&self) -> PathBuf {
    let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    self.path.with_file_name(name)
  }
}

impl SnapshotStore for JsonFileStore {
  fn load(&self) -> Result<Option<Vec<AssetRecord>>, RegistryError> {
    if !self.path.exists() {
      return Ok(None);
    }
    let content = fs::read_to_string(&self.path)?;
    let records: Vec<AssetRecord> = serde_json::from_str(&content)?;
    debug!("Read {} records from {}", records.len(), self.path.display());
    Ok(Some(records))
  }

  fn save(&self, records: &[AssetRecord]) -> Result<(), RegistryError> {
    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent)?;
    }
    let tmp = self.temp_path();
    fs::write(&tmp, serde_json::to_vec(records)?)?;
    fs::rename(&tmp, &self.path)?;
    Ok(())
  }

  fn age(&self) -> Option<Duration> {
    let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok()?;
    // A clock behind the file's mtime counts as fresh
    Some(SystemTime::now().duration_since(modified).unwrap_or_default())
  }
}

/// In-process store, used for tests and throwaway registries.
#[derive(Debug, Default)]
pub struct MemoryStore {
  inner: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
  records: Option<Vec<AssetRecord>>,
  age: Option<Duration>,
  saves: usize,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Pre-seeded snapshot that pretends to be `age` old.
  pub fn with_snapshot(records: Vec<AssetRecord>, age: Duration) -> Self {
    Self {
      inner: Mutex::new(MemoryState { records: Some(records), age: Some(age), saves: 0 }),
    }
  }

  /// Number of `save` calls so far
  pub fn saves(&self) -> usize {
    self.state().saves
  }

  pub fn snapshot(&self) -> Option<Vec<AssetRecord>> {
    self.state().records.clone()
  }

  fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
    self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

impl SnapshotStore for MemoryStore {
  fn load(&self) -> Result<Option<Vec<AssetRecord>>, RegistryError> {
    Ok(self.state().records.clone())
  }

  fn save(&self, records: &[AssetRecord]) -> Result<(), RegistryError> {
    let mut state = self.state();
    state.records = Some(records.to_vec());
    state.age = Some(Duration::ZERO);
    state.saves += 1;
    Ok(())
  }

  fn age(&self) -> Option<Duration> {
    self.state().age
  }
}
