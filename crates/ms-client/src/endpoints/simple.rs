//! Batch spot prices via `/simple/price`

use super::EndpointCore;
use crate::transport::RateLimitQuota;
use ms_core::{Endpoint, Result, VS_CURRENCY};
use serde_json::{Map, Value};

/// Raw `/simple/price` body: asset id -> field map, in response order.
pub type PricePayload = Map<String, Value>;

/// Outcome of one `/simple/price` call.
#[derive(Debug, Clone)]
pub enum PriceResponse {
  /// 304: nothing changed since the previous poll
  NotModified { quota: Option<RateLimitQuota> },
  Prices { payload: PricePayload, quota: Option<RateLimitQuota> },
}

impl PriceResponse {
  pub fn quota(&self) -> Option<&RateLimitQuota> {
    match self {
      PriceResponse::NotModified { quota } | PriceResponse::Prices { quota, .. } => quota.as_ref(),
    }
  }
}

/// Price endpoints
pub struct SimpleEndpoints {
  core: EndpointCore,
}

impl SimpleEndpoints {
  pub fn new(core: EndpointCore) -> Self {
    Self { core }
  }

  /// Query parameters for a batch price request.
  pub fn price_params(ids: &[String]) -> Vec<(&'static str, String)> {
    vec![
      ("ids", ids.join(",")),
      ("vs_currencies", VS_CURRENCY.to_string()),
      ("include_last_updated_at", "true".to_string()),
      ("include_market_cap", "true".to_string()),
      ("include_24hr_vol", "true".to_string()),
    ]
  }

  /// Single attempt at fetching prices, market caps and volumes for `ids`.
  pub async fn price(&self, ids: &[String]) -> Result<PriceResponse> {
    let response = self.core.get(Endpoint::SimplePrice, &Self::price_params(ids)).await?;
    if response.is_not_modified() {
      return Ok(PriceResponse::NotModified { quota: response.quota });
    }
    let payload: PricePayload = response.json()?;
    Ok(PriceResponse::Prices { payload, quota: response.quota })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_price_params_join_ids() {
    let ids = vec!["bitcoin".to_string(), "ethereum".to_string()];
    let params = SimpleEndpoints::price_params(&ids);
    assert_eq!(params[0], ("ids", "bitcoin,ethereum".to_string()));
    assert!(params.contains(&("include_24hr_vol", "true".to_string())));
    assert!(params.contains(&("vs_currencies", "usd".to_string())));
  }
}
