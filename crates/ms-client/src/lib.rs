//! # ms-client
//!
//! A CoinGecko API client for the Market Sentinel pipeline with no database
//! dependencies.
//!
//! ## Features
//!
//! - **Listings**: full asset universe and market-cap ranked pages
//! - **Batch prices**: `/simple/price` with market cap, volume and last update
//! - **Rate Limiting**: per-minute quota shared by every endpoint group
//! - **Diagnostics**: 4xx/5xx answers are classified for operators
//!
//! ## Error Handling
//!
//! All methods return `Result<T, ms_core::Error>`. Whether a failure is worth
//! another attempt is answered by [`ms_core::Error::is_transient`]; the
//! [`retry::RetryPolicy`] decides how long to wait.

pub mod client;
pub mod endpoints;
pub mod retry;
pub mod transport;

// Re-export the main client and common types
pub use client::CoinGeckoClient;
pub use endpoints::simple::{PricePayload, PriceResponse};
pub use ms_core::{Config, Error, Result};
pub use retry::{Backoff, RetryPolicy};
pub use transport::{ApiResponse, RateLimitQuota, Transport};
