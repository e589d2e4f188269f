/*
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 */

//! Upstream listings and how they are folded into a registry snapshot.

use async_trait::async_trait;
use ms_client::CoinGeckoClient;
use ms_core::{AssetRecord, AssetStatus, ListedAsset};
use std::collections::{HashMap, HashSet};

/// Source of the two listings a registry is built from.
#[async_trait]
pub trait ListingSource: Send + Sync {
  /// Top `limit` assets by market capitalization, highest first.
  async fn priority_listing(&self, limit: u32) -> ms_core::Result<Vec<ListedAsset>>;

  /// The whole asset universe.
  async fn full_listing(&self) -> ms_core::Result<Vec<ListedAsset>>;
}

#[async_trait]
impl ListingSource for CoinGeckoClient {
  async fn priority_listing(&self, limit: u32) -> ms_core::Result<Vec<ListedAsset>> {
    self.coins().markets(limit, 1).await
  }

  async fn full_listing(&self) -> ms_core::Result<Vec<ListedAsset>> {
    self.coins().list().await
  }
}

/// Priority entries first, then the full listing; the first occurrence of an
/// id wins. Health fields are carried over from `previous` by id.
pub fn merge(
  priority: &[ListedAsset],
  full: &[ListedAsset],
  previous: &[AssetRecord],
) -> Vec<AssetRecord> {
  let health: HashMap<&str, (AssetStatus, u32)> =
    previous.iter().map(|r| (r.id.as_str(), (r.status, r.failure_count))).collect();

  let mut seen: HashSet<&str> = HashSet::with_capacity(priority.len() + full.len());
  let mut merged = Vec::with_capacity(priority.len() + full.len());

  for listed in priority.iter().chain(full) {
    if !seen.insert(listed.id.as_str()) {
      continue;
    }
    let mut record = AssetRecord::new(&listed.id, &listed.symbol, &listed.name);
    if let Some(&(status, failure_count)) = health.get(listed.id.as_str()) {
      record.status = status;
      record.failure_count = failure_count;
    }
    merged.push(record);
  }

  merged
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn listed(id: &str) -> ListedAsset {
    ListedAsset::new(id, id, id.to_uppercase())
  }

  fn ids(records: &[AssetRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
  }

  #[test]
  fn test_merge_priority_first_without_duplicates() {
    let merged = merge(&[listed("a"), listed("b")], &[listed("b"), listed("c"), listed("a")], &[]);
    assert_eq!(ids(&merged), vec!["a", "b", "c"]);
  }

  #[test]
  fn test_merge_is_deterministic() {
    let priority = [listed("a"), listed("b")];
    let full = [listed("b"), listed("c"), listed("a")];
    assert_eq!(merge(&priority, &full, &[]), merge(&priority, &full, &[]));
  }

  #[test]
  fn test_merge_restores_health_by_id() {
    let mut sick = AssetRecord::new("c", "c", "C");
    sick.status = AssetStatus::Inactive;
    sick.failure_count = 4;
    let mut recovering = AssetRecord::new("a", "a", "A");
    recovering.failure_count = 1;

    let merged = merge(&[listed("a")], &[listed("c"), listed("d")], &[sick, recovering]);

    assert_eq!(merged[0].failure_count, 1);
    assert_eq!(merged[0].status, AssetStatus::Active);
    assert_eq!(merged[1].status, AssetStatus::Inactive);
    assert_eq!(merged[1].failure_count, 4);
    assert_eq!(merged[2].status, AssetStatus::Active);
    assert_eq!(merged[2].failure_count, 0);
  }

  #[test]
  fn test_merge_with_one_side_missing() {
    assert_eq!(ids(&merge(&[], &[listed("x"), listed("y")], &[])), vec!["x", "y"]);
    assert_eq!(ids(&merge(&[listed("x")], &[], &[])), vec!["x"]);
    assert!(merge(&[], &[], &[]).is_empty());
  }
}
