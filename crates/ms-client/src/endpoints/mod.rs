//! Endpoint groups of the CoinGecko API consumed by the pipeline

pub mod coins;
pub mod simple;

use crate::transport::{ApiResponse, Transport};
use governor::{
  clock::DefaultClock,
  middleware::NoOpMiddleware,
  state::{InMemoryState, NotKeyed},
  RateLimiter,
};
use ms_core::{Endpoint, Result};
use std::sync::Arc;

/// Direct (un-keyed) limiter shared by every endpoint group.
pub type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Common endpoint structure
///
/// All endpoint groups share the transport and rate limiter so the
/// per-minute quota is respected across groups.
#[derive(Clone)]
pub struct EndpointCore {
  pub transport: Arc<Transport>,
  pub rate_limiter: Arc<DirectRateLimiter>,
}

impl EndpointCore {
  /// Create a new endpoint core
  pub fn new(transport: Arc<Transport>, rate_limiter: Arc<DirectRateLimiter>) -> Self {
    Self { transport, rate_limiter }
  }

  /// Wait for the rate limiter, then issue one request.
  pub async fn get(&self, endpoint: Endpoint, params: &[(&str, String)]) -> Result<ApiResponse> {
    self.rate_limiter.until_ready().await;
    self.transport.get(endpoint, params).await
  }
}
