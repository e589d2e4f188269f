//! HTTP transport layer for CoinGecko API requests

use ms_core::{ApiFailure, Config, Endpoint, Error, Result};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Credit counters reported by the upstream on every response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitQuota {
  pub remaining: u64,
  pub limit: Option<u64>,
}

impl RateLimitQuota {
  fn from_headers(headers: &HeaderMap) -> Option<Self> {
    let remaining = header_u64(headers, "x-ratelimit-remaining")?;
    Some(Self { remaining, limit: header_u64(headers, "x-ratelimit-limit") })
  }
}

impl std::fmt::Display for RateLimitQuota {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self.limit {
      Some(limit) => write!(f, "{}/{}", self.remaining, limit),
      None => write!(f, "{}/?", self.remaining),
    }
  }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
  headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// A successful (2xx or 304) answer from the API.
#[derive(Debug, Clone)]
pub struct ApiResponse {
  pub status: u16,
  pub quota: Option<RateLimitQuota>,
  pub body: String,
}

impl ApiResponse {
  /// 304: upstream data unchanged since the last poll
  pub fn is_not_modified(&self) -> bool {
    self.status == StatusCode::NOT_MODIFIED.as_u16()
  }

  pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
    serde_json::from_str::<T>(&self.body).map_err(|e| {
      error!("Response text (first 500 chars): {}", truncate(&self.body, 500));
      Error::Parse(format!("Failed to parse response: {}", e))
    })
  }
}

/// HTTP transport layer for making requests to the CoinGecko API
pub struct Transport {
  client: Client,
  base_url: String,
  auth: Option<(&'static str, String)>,
}

impl Transport {
  /// Create a new transport instance
  pub fn new(config: &Config) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .user_agent("market-sentinel/0.1.0")
      .build()
      .map_err(|e| Error::Transport(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Self {
      client,
      base_url: config.base_url.trim_end_matches('/').to_string(),
      auth: config.auth_header().map(|(header, key)| (header, key.to_string())),
    })
  }

  /// Issue a single GET request; no retries happen at this layer.
  ///
  /// 4xx/5xx answers are logged with an operator diagnostic and returned as
  /// [`Error::Api`]. A 304 is returned as a normal response.
  #[instrument(skip(self, params), fields(endpoint = %endpoint))]
  pub async fn get(&self, endpoint: Endpoint, params: &[(&str, String)]) -> Result<ApiResponse> {
    let url = self.build_url(endpoint);
    debug!("Making request to: {} ({} params)", url, params.len());

    let mut request = self.client.get(&url).query(params).header("accept", "application/json");
    if let Some((header, key)) = &self.auth {
      request = request.header(*header, key);
    }

    let response = request.send().await.map_err(|e| {
      warn!("Request to {} failed: {}", endpoint, e);
      Error::Transport(format!("Request failed: {}", e))
    })?;

    let status = response.status();
    let quota = RateLimitQuota::from_headers(response.headers());
    if let Some(quota) = &quota {
      info!("Credits: {} remaining.", quota);
    }
    let retry_after = header_u64(response.headers(), "retry-after");

    let body = response
      .text()
      .await
      .map_err(|e| Error::Transport(format!("Failed to read response body: {}", e)))?;

    if status.is_client_error() || status.is_server_error() {
      let failure = ApiFailure::new(status.as_u16(), extract_error_message(&body), retry_after);
      log_api_error(&failure);
      return Err(Error::Api(failure));
    }

    debug!("Response body length: {} bytes", body.len());
    Ok(ApiResponse { status: status.as_u16(), quota, body })
  }

  fn build_url(&self, endpoint: Endpoint) -> String {
    format!("{}{}", self.base_url, endpoint.path())
  }
}

/// Pull the human readable message out of a CoinGecko error body.
///
/// Handles both `{"error": "..."}` and
/// `{"status": {"error_code": 10002, "error_message": "..."}}`.
fn extract_error_message(body: &str) -> String {
  if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
    if let Some(msg) = value.get("error").and_then(|v| v.as_str()) {
      return msg.to_string();
    }
    if let Some(status) = value.get("status") {
      let message = status.get("error_message").and_then(|v| v.as_str()).unwrap_or("No message");
      return match status.get("error_code").and_then(|v| v.as_i64()) {
        Some(code) => format!("{} (error_code {})", message, code),
        None => message.to_string(),
      };
    }
  }
  let trimmed = body.trim();
  if trimmed.is_empty() {
    "No message".to_string()
  } else {
    truncate(trimmed, 200)
  }
}

fn truncate(text: &str, max_chars: usize) -> String {
  text.chars().take(max_chars).collect()
}

fn log_api_error(failure: &ApiFailure) {
  error!("API Error {}: {}", failure.status, failure.message);
  if failure.kind.is_transient() {
    match failure.retry_after {
      Some(secs) => warn!("Solution: {} Retry-After: {}s", failure.kind.diagnostic(), secs),
      None => warn!("Solution: {}", failure.kind.diagnostic()),
    }
  } else {
    error!("Solution: {}", failure.kind.diagnostic());
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ms_core::ApiErrorKind;
  use wiremock::matchers::{header, method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  #[test]
  fn test_extract_error_message_shapes() {
    assert_eq!(extract_error_message(r#"{"error": "coin not found"}"#), "coin not found");
    assert_eq!(
      extract_error_message(
        r#"{"status": {"error_code": 10002, "error_message": "API Key Missing"}}"#
      ),
      "API Key Missing (error_code 10002)"
    );
    assert_eq!(extract_error_message("Bad Gateway"), "Bad Gateway");
    assert_eq!(extract_error_message("   "), "No message");
  }

  #[tokio::test]
  async fn test_get_sends_key_and_reads_quota() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/ping"))
      .and(query_param("a", "1"))
      .and(header("x-cg-demo-api-key", "demo-key"))
      .respond_with(
        ResponseTemplate::new(200)
          .insert_header("x-ratelimit-remaining", "42")
          .insert_header("x-ratelimit-limit", "100")
          .set_body_string(r#"{"gecko_says": "(V3) To the Moon!"}"#),
      )
      .expect(1)
      .mount(&server)
      .await;

    let mut config = Config::for_base_url(server.uri());
    config.api_key = Some("demo-key".to_string());
    let transport = Transport::new(&config).unwrap();

    let response = transport.get(Endpoint::Ping, &[("a", "1".to_string())]).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.quota, Some(RateLimitQuota { remaining: 42, limit: Some(100) }));
    let body: serde_json::Value = response.json().unwrap();
    assert!(body.get("gecko_says").is_some());
  }

  #[tokio::test]
  async fn test_get_classifies_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/ping"))
      .respond_with(
        ResponseTemplate::new(429)
          .insert_header("retry-after", "60")
          .set_body_string(r#"{"status": {"error_code": 429, "error_message": "Throttled"}}"#),
      )
      .mount(&server)
      .await;

    let transport = Transport::new(&Config::for_base_url(server.uri())).unwrap();
    match transport.get(Endpoint::Ping, &[]).await {
      Err(Error::Api(failure)) => {
        assert_eq!(failure.kind, ApiErrorKind::RateLimited);
        assert_eq!(failure.retry_after, Some(60));
        assert!(failure.message.contains("Throttled"));
      }
      other => panic!("Expected rate limit failure, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_get_passes_not_modified_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/ping"))
      .respond_with(ResponseTemplate::new(304))
      .mount(&server)
      .await;

    let transport = Transport::new(&Config::for_base_url(server.uri())).unwrap();
    let response = transport.get(Endpoint::Ping, &[]).await.unwrap();
    assert!(response.is_not_modified());
  }
}
