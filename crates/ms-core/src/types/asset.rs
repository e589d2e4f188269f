/*
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 */

//! Asset identity and health types.

use serde::{Deserialize, Serialize};

/// Health of an asset in the registry.
///
/// Inactive assets are skipped by ingestion runs but stay in the registry so
/// a later successful fetch can bring them back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
  #[default]
  Active,
  Inactive,
}

impl std::fmt::Display for AssetStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      AssetStatus::Active => write!(f, "active"),
      AssetStatus::Inactive => write!(f, "inactive"),
    }
  }
}

/// One entry of the registry snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
  /// Canonical upstream identifier, e.g. `bitcoin`
  pub id: String,
  /// Ticker; not unique across assets
  pub symbol: String,
  pub name: String,
  #[serde(default)]
  pub status: AssetStatus,
  #[serde(default)]
  pub failure_count: u32,
}

impl AssetRecord {
  pub fn new(id: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      symbol: symbol.into(),
      name: name.into(),
      status: AssetStatus::Active,
      failure_count: 0,
    }
  }

  pub fn is_active(&self) -> bool {
    self.status == AssetStatus::Active
  }
}

/// An asset as it appears in an upstream listing (`/coins/list` or
/// `/coins/markets`). Extra listing fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListedAsset {
  pub id: String,
  pub symbol: String,
  pub name: String,
  #[serde(default)]
  pub market_cap_rank: Option<u32>,
}

impl ListedAsset {
  pub fn new(id: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>) -> Self {
    Self { id: id.into(), symbol: symbol.into(), name: name.into(), market_cap_rank: None }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_record_defaults_missing_health_fields() {
    let json = r#"{"id": "bitcoin", "symbol": "btc", "name": "Bitcoin"}"#;
    let record: AssetRecord = serde_json::from_str(json).unwrap();
    assert_eq!(record.status, AssetStatus::Active);
    assert_eq!(record.failure_count, 0);
  }

  #[test]
  fn test_status_serializes_lowercase() {
    let mut record = AssetRecord::new("x", "x", "X");
    record.status = AssetStatus::Inactive;
    let json = serde_json::to_string(&record).unwrap();
    assert!(json.contains(r#""status":"inactive""#));
  }

  #[test]
  fn test_listed_asset_ignores_market_fields() {
    let json = r#"{"id": "ethereum", "symbol": "eth", "name": "Ethereum",
                   "current_price": 3000.5, "market_cap_rank": 2, "image": "x.png"}"#;
    let listed: ListedAsset = serde_json::from_str(json).unwrap();
    assert_eq!(listed.id, "ethereum");
    assert_eq!(listed.market_cap_rank, Some(2));
  }
}
