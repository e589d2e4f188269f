/*
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 */

//! One price request per chunk, retried with backoff on transient failures.

use crate::error::FetchError;
use async_trait::async_trait;
use ms_client::{CoinGeckoClient, PricePayload, PriceResponse, RateLimitQuota, RetryPolicy};
use ms_core::Error;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Largest id list `/simple/price` accepts in one call
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Single-attempt batch price lookup.
#[async_trait]
pub trait PriceSource: Send + Sync {
  async fn price(&self, ids: &[String]) -> ms_core::Result<PriceResponse>;
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
  async fn price(&self, ids: &[String]) -> ms_core::Result<PriceResponse> {
    self.simple().price(ids).await
  }
}

/// What a chunk fetch produced.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
  Data { payload: PricePayload, quota: Option<RateLimitQuota> },
  /// 304 from upstream; the chunk is skipped without counting as a failure
  NotModified { quota: Option<RateLimitQuota> },
  /// Nothing was requested
  Empty,
}

impl FetchOutcome {
  pub fn quota(&self) -> Option<&RateLimitQuota> {
    match self {
      FetchOutcome::Data { quota, .. } | FetchOutcome::NotModified { quota } => quota.as_ref(),
      FetchOutcome::Empty => None,
    }
  }
}

/// Split ids into request-sized chunks. A zero size is treated as one.
pub fn chunk_ids(ids: &[String], chunk_size: usize) -> Vec<&[String]> {
  ids.chunks(chunk_size.max(1)).collect()
}

pub struct BatchFetcher {
  source: Arc<dyn PriceSource>,
  policy: RetryPolicy,
}

impl BatchFetcher {
  pub fn new(source: Arc<dyn PriceSource>, policy: RetryPolicy) -> Self {
    Self { source, policy }
  }

  /// Fetch one chunk.
  ///
  /// Transport errors, 408, 429 and 5xx are retried until the policy runs
  /// out, then reported as [`FetchError::Exhausted`]. Other 4xx answers are
  /// returned at once as [`FetchError::Rejected`].
  pub async fn fetch(&self, ids: &[String]) -> Result<FetchOutcome, FetchError> {
    if ids.is_empty() {
      return Ok(FetchOutcome::Empty);
    }

    let mut attempt = 0;
    loop {
      attempt += 1;
      match self.source.price(ids).await {
        Ok(PriceResponse::NotModified { quota }) => {
          info!("Data not modified (304). Skipping chunk.");
          return Ok(FetchOutcome::NotModified { quota });
        }
        Ok(PriceResponse::Prices { payload, quota }) => {
          return Ok(FetchOutcome::Data { payload, quota });
        }
        Err(Error::Api(failure)) if !failure.kind.is_transient() => {
          error!("Request rejected, not retrying: {}", failure);
          return Err(FetchError::Rejected(failure));
        }
        Err(e) if !e.is_transient() => {
          error!("Response could not be used: {}", e);
          return Err(FetchError::Decode(e.to_string()));
        }
        Err(e) => {
          if !self.policy.allows_retry_after(attempt) {
            error!("Chunk of {} ids failed after {} attempts: {}", ids.len(), attempt, e);
            return Err(FetchError::Exhausted { attempts: attempt, source: e });
          }
          let delay = self.policy.delay_after(attempt);
          warn!(
            "Attempt {}/{} failed: {}. Retrying in {:?}",
            attempt, self.policy.max_attempts, e, delay
          );
          sleep(delay).await;
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ms_client::Config;
  use ms_core::ApiErrorKind;
  use std::time::Duration;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  const PRICES: &str = r#"{"bitcoin": {"usd": 50000, "last_updated_at": 1700000000}}"#;

  fn fast_policy() -> RetryPolicy {
    RetryPolicy::exponential(5, Duration::from_millis(1), Duration::from_millis(16))
  }

  fn fetcher(server: &MockServer) -> BatchFetcher {
    let client = CoinGeckoClient::new(Config::for_base_url(server.uri())).unwrap();
    BatchFetcher::new(Arc::new(client), fast_policy())
  }

  fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn test_chunk_ids() {
    let all: Vec<String> = (0..1001).map(|i| format!("coin-{}", i)).collect();
    let chunks = chunk_ids(&all, DEFAULT_CHUNK_SIZE);
    let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
    assert_eq!(sizes, vec![500, 500, 1]);
    assert_eq!(chunk_ids(&all[..3], 0).len(), 3);
  }

  #[tokio::test]
  async fn test_empty_chunk_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

    let outcome = fetcher(&server).fetch(&[]).await.unwrap();
    assert!(matches!(outcome, FetchOutcome::Empty));
  }

  #[tokio::test]
  async fn test_succeeds_on_fifth_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/simple/price"))
      .respond_with(ResponseTemplate::new(500))
      .up_to_n_times(4)
      .expect(4)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/simple/price"))
      .and(query_param("ids", "bitcoin,ethereum"))
      .respond_with(
        ResponseTemplate::new(200).insert_header("x-ratelimit-remaining", "9").set_body_string(PRICES),
      )
      .expect(1)
      .mount(&server)
      .await;

    let outcome = fetcher(&server).fetch(&ids(&["bitcoin", "ethereum"])).await.unwrap();
    match outcome {
      FetchOutcome::Data { payload, quota } => {
        assert!(payload.contains_key("bitcoin"));
        assert_eq!(quota.map(|q| q.remaining), Some(9));
      }
      other => panic!("Expected data, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_exhausts_after_five_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/simple/price"))
      .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
      .expect(5)
      .mount(&server)
      .await;

    match fetcher(&server).fetch(&ids(&["bitcoin"])).await {
      Err(FetchError::Exhausted { attempts, source: Error::Api(failure) }) => {
        assert_eq!(attempts, 5);
        assert_eq!(failure.kind, ApiErrorKind::RateLimited);
        assert_eq!(failure.retry_after, Some(30));
      }
      other => panic!("Expected exhaustion, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_auth_failure_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/simple/price"))
      .respond_with(ResponseTemplate::new(401).set_body_string(
        r#"{"status": {"error_code": 10002, "error_message": "API Key Missing"}}"#,
      ))
      .expect(1)
      .mount(&server)
      .await;

    match fetcher(&server).fetch(&ids(&["bitcoin"])).await {
      Err(FetchError::Rejected(failure)) => assert_eq!(failure.kind, ApiErrorKind::Unauthorized),
      other => panic!("Expected rejection, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_not_modified_skips_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/simple/price"))
      .respond_with(ResponseTemplate::new(304))
      .expect(1)
      .mount(&server)
      .await;

    let outcome = fetcher(&server).fetch(&ids(&["bitcoin"])).await.unwrap();
    assert!(matches!(outcome, FetchOutcome::NotModified { .. }));
  }

  #[tokio::test]
  async fn test_garbled_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/simple/price"))
      .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
      .expect(1)
      .mount(&server)
      .await;

    let result = fetcher(&server).fetch(&ids(&["bitcoin"])).await;
    assert!(matches!(result, Err(FetchError::Decode(_))));
  }
}
