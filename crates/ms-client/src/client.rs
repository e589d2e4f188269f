/*
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 */

use crate::endpoints::{
  coins::CoinsEndpoints, simple::SimpleEndpoints, DirectRateLimiter, EndpointCore,
};
use crate::transport::Transport;
use governor::{Quota, RateLimiter};
use ms_core::{Config, Result};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Main CoinGecko API client
///
/// Provides access to the listing and price endpoints through endpoint
/// groups. Handles authentication and the per-minute rate limit; retries are
/// the caller's business (see [`crate::retry::RetryPolicy`]).
///
/// # Examples
///
/// ```ignore
/// use ms_client::CoinGeckoClient;
/// use ms_core::Config;
///
/// let client = CoinGeckoClient::new(Config::from_env()?)?;
/// let top = client.coins().markets(250, 1).await?;
/// ```
#[derive(Clone)]
pub struct CoinGeckoClient {
  core: EndpointCore,
}

impl CoinGeckoClient {
  /// Create a new client
  ///
  /// # Errors
  ///
  /// Returns an error if the HTTP client cannot be created.
  pub fn new(config: Config) -> Result<Self> {
    // Ensure rate_limit is non-zero, fallback to default if invalid
    let rate_limit = NonZeroU32::new(config.rate_limit)
      .or_else(|| NonZeroU32::new(ms_core::DEMO_RATE_LIMIT))
      .unwrap_or(NonZeroU32::MIN);
    let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(rate_limit)));

    Self::with_rate_limiter(config, rate_limiter)
  }

  /// Create a new client with custom rate limiting
  pub fn with_rate_limiter(config: Config, rate_limiter: Arc<DirectRateLimiter>) -> Result<Self> {
    let transport = Arc::new(Transport::new(&config)?);
    Ok(Self { core: EndpointCore::new(transport, rate_limiter) })
  }

  /// Asset listing endpoints
  pub fn coins(&self) -> CoinsEndpoints {
    CoinsEndpoints::new(self.core.clone())
  }

  /// Price endpoints
  pub fn simple(&self) -> SimpleEndpoints {
    SimpleEndpoints::new(self.core.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::endpoints::simple::PriceResponse;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  #[tokio::test]
  async fn test_markets_clamps_page_size() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/coins/markets"))
      .and(query_param("per_page", "250"))
      .and(query_param("order", "market_cap_desc"))
      .respond_with(ResponseTemplate::new(200).set_body_string(
        r#"[{"id": "bitcoin", "symbol": "btc", "name": "Bitcoin", "market_cap_rank": 1}]"#,
      ))
      .expect(1)
      .mount(&server)
      .await;

    let client = CoinGeckoClient::new(Config::for_base_url(server.uri())).unwrap();
    let coins = client.coins().markets(1000, 1).await.unwrap();
    assert_eq!(coins.len(), 1);
    assert_eq!(coins[0].market_cap_rank, Some(1));
  }

  #[tokio::test]
  async fn test_simple_price_keeps_response_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/simple/price"))
      .and(query_param("ids", "zcash,bitcoin"))
      .respond_with(ResponseTemplate::new(200).set_body_string(
        r#"{"zcash": {"usd": 30.1, "last_updated_at": 1700000000},
            "bitcoin": {"usd": 95000, "last_updated_at": 1700000000}}"#,
      ))
      .mount(&server)
      .await;

    let client = CoinGeckoClient::new(Config::for_base_url(server.uri())).unwrap();
    let ids = vec!["zcash".to_string(), "bitcoin".to_string()];
    match client.simple().price(&ids).await.unwrap() {
      PriceResponse::Prices { payload, .. } => {
        let keys: Vec<&String> = payload.keys().collect();
        assert_eq!(keys, vec!["zcash", "bitcoin"]);
      }
      other => panic!("Expected prices, got {:?}", other),
    }
  }
}
