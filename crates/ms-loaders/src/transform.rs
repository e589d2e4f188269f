/*
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 */

//! Validation of raw `/simple/price` payloads into [`MarketSample`] rows.

use crate::error::RegistryError;
use crate::registry::Registry;
use chrono::{DateTime, Utc};
use ms_client::PricePayload;
use ms_core::MarketSample;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Symbol used when the registry does not know an id
pub const UNKNOWN_SYMBOL: &str = "UNK";

/// Upper bound above which a price is reported as suspicious
pub const DEFAULT_MAX_PRICE: f64 = 1e9;

/// What the transformer needs from the registry.
#[cfg_attr(test, mockall::automock)]
pub trait AssetLedger {
  fn symbol_of(&self, id: &str) -> Option<String>;
  fn record_failure(&mut self, id: &str) -> Result<(), RegistryError>;
  fn record_success(&mut self, id: &str) -> Result<(), RegistryError>;
}

impl AssetLedger for Registry {
  fn symbol_of(&self, id: &str) -> Option<String> {
    self.get(id).map(|r| r.symbol.clone())
  }

  fn record_failure(&mut self, id: &str) -> Result<(), RegistryError> {
    Registry::record_failure(self, id)
  }

  fn record_success(&mut self, id: &str) -> Result<(), RegistryError> {
    Registry::record_success(self, id)
  }
}

#[derive(Debug, Clone)]
pub struct Transformer {
  max_price: f64,
}

impl Default for Transformer {
  fn default() -> Self {
    Self { max_price: DEFAULT_MAX_PRICE }
  }
}

impl Transformer {
  pub fn new(max_price: f64) -> Self {
    Self { max_price }
  }

  /// Turn one chunk's payload into samples, reporting every requested id
  /// to the ledger exactly once: missing or invalid ids as failures, emitted
  /// ids as successes.
  ///
  /// Output follows payload order.
  pub fn transform(
    &self,
    payload: &PricePayload,
    requested: &[String],
    ledger: &mut dyn AssetLedger,
  ) -> Vec<MarketSample> {
    let missing: Vec<&String> = requested.iter().filter(|id| !payload.contains_key(*id)).collect();
    if !missing.is_empty() {
      warn!("Missing data for {} assets: {:?}", missing.len(), missing);
    }
    for id in missing {
      note(ledger.record_failure(id), id);
    }

    let mut seen = HashSet::new();
    let mut samples = Vec::with_capacity(payload.len());
    for (asset_id, fields) in payload {
      if !seen.insert(asset_id.as_str()) {
        continue;
      }
      match self.parse_sample(asset_id, fields, &*ledger) {
        Ok(sample) => {
          note(ledger.record_success(asset_id), asset_id);
          samples.push(sample);
        }
        Err(reason) => {
          warn!("Invalid data for {}: {}", asset_id, reason);
          note(ledger.record_failure(asset_id), asset_id);
        }
      }
    }
    debug!("Transformed {} of {} requested assets", samples.len(), requested.len());
    samples
  }

  fn parse_sample(
    &self,
    asset_id: &str,
    fields: &Value,
    ledger: &dyn AssetLedger,
  ) -> Result<MarketSample, String> {
    let fields = fields.as_object().ok_or_else(|| format!("expected an object, got {}", fields))?;

    let price = numeric_field(fields, "usd")?.ok_or("price missing")?;
    let observed_at = timestamp_field(fields, "last_updated_at")?.ok_or("timestamp missing")?;
    if price < 0.0 {
      return Err(format!("negative price {}", price));
    }
    if price > self.max_price {
      warn!("Suspicious price for {}: {} exceeds {}", asset_id, price, self.max_price);
    }

    Ok(MarketSample {
      asset_id: asset_id.to_string(),
      symbol: ledger.symbol_of(asset_id).unwrap_or_else(|| UNKNOWN_SYMBOL.to_string()),
      price,
      market_cap: numeric_field(fields, "usd_market_cap")?.unwrap_or(0.0),
      volume_24h: numeric_field(fields, "usd_24h_vol")?.unwrap_or(0.0),
      observed_at,
    })
  }
}

fn note(result: Result<(), RegistryError>, id: &str) {
  if let Err(e) = result {
    warn!("Could not persist health of {}: {}", id, e);
  }
}

/// Numbers and numeric strings are accepted; null or absent is `None`.
fn numeric_field(fields: &Map<String, Value>, key: &str) -> Result<Option<f64>, String> {
  let value = match fields.get(key) {
    None | Some(Value::Null) => return Ok(None),
    Some(Value::Number(n)) => n.as_f64(),
    Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
    Some(_) => None,
  };
  match value {
    Some(v) if v.is_finite() => Ok(Some(v)),
    _ => Err(format!("{} is not a finite number: {}", key, fields[key])),
  }
}

fn timestamp_field(fields: &Map<String, Value>, key: &str) -> Result<Option<DateTime<Utc>>, String> {
  let Some(secs) = numeric_field(fields, key)? else {
    return Ok(None);
  };
  // i64 range check before the cast; chrono rejects the rest
  if secs < i64::MIN as f64 || secs > i64::MAX as f64 {
    return Err(format!("{} out of range: {}", key, secs));
  }
  DateTime::from_timestamp(secs as i64, 0)
    .map(Some)
    .ok_or_else(|| format!("{} out of range: {}", key, secs))
}
