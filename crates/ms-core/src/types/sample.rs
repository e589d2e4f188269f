//! Validated price observations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A clean, persistable price row for one asset.
///
/// `observed_at` comes from the upstream `last_updated_at` field, so two
/// fetches of unchanged data produce the same `(asset_id, observed_at)` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSample {
  pub asset_id: String,
  pub symbol: String,
  pub price: f64,
  pub market_cap: f64,
  pub volume_24h: f64,
  pub observed_at: DateTime<Utc>,
}
