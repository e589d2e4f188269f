/*
 *
 *
 *
 *
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 *
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

pub mod config;
pub mod error;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::Config;
pub use error::{ApiErrorKind, ApiFailure, Error, Result};
pub use types::{AssetRecord, AssetStatus, ListedAsset, MarketSample};

/// The CoinGecko v3 endpoints consumed by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
  /// Full universe of assets (id, symbol, name)
  CoinsList,
  /// Assets ranked by market capitalization
  CoinsMarkets,
  /// Batch price lookup for a comma-joined id list
  SimplePrice,
  Ping,
}

impl Endpoint {
  pub fn path(&self) -> &'static str {
    match self {
      Endpoint::CoinsList => "/coins/list",
      Endpoint::CoinsMarkets => "/coins/markets",
      Endpoint::SimplePrice => "/simple/price",
      Endpoint::Ping => "/ping",
    }
  }
}

impl std::fmt::Display for Endpoint {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.path())
  }
}

/// Public (demo) API root
pub const COINGECKO_DEMO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Paid plan API root
pub const COINGECKO_PRO_BASE_URL: &str = "https://pro-api.coingecko.com/api/v3";

pub const DEMO_API_KEY_HEADER: &str = "x-cg-demo-api-key";
pub const PRO_API_KEY_HEADER: &str = "x-cg-pro-api-key";

/// API rate limits
pub const DEMO_RATE_LIMIT: u32 = 30; // requests per minute
pub const PRO_RATE_LIMIT: u32 = 500; // requests per minute

/// Quote currency requested from the upstream API
pub const VS_CURRENCY: &str = "usd";

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_endpoint_paths() {
    assert_eq!(Endpoint::SimplePrice.to_string(), "/simple/price");
    assert_eq!(Endpoint::CoinsList.path(), "/coins/list");
    assert_eq!(Endpoint::CoinsMarkets.path(), "/coins/markets");
  }
}
