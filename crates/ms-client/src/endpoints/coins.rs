//! Asset listings: the full universe and the market-cap ranking

use super::EndpointCore;
use ms_core::{Endpoint, ListedAsset, Result, VS_CURRENCY};
use tracing::info;

/// Upper bound of `per_page` accepted by `/coins/markets`
pub const MAX_PER_PAGE: u32 = 250;

/// Listing endpoints (`/coins/list`, `/coins/markets`)
pub struct CoinsEndpoints {
  core: EndpointCore,
}

impl CoinsEndpoints {
  pub fn new(core: EndpointCore) -> Self {
    Self { core }
  }

  /// Every asset known upstream, id + symbol + name only.
  pub async fn list(&self) -> Result<Vec<ListedAsset>> {
    info!("Fetching complete coin list...");
    let response = self.core.get(Endpoint::CoinsList, &[]).await?;
    let coins: Vec<ListedAsset> = response.json()?;
    info!("Fetched {} total coins from {}", coins.len(), Endpoint::CoinsList);
    Ok(coins)
  }

  /// One page of assets ordered by market capitalization, highest first.
  ///
  /// `per_page` is clamped to [`MAX_PER_PAGE`].
  pub async fn markets(&self, per_page: u32, page: u32) -> Result<Vec<ListedAsset>> {
    let per_page = per_page.clamp(1, MAX_PER_PAGE);
    info!("Fetching top {} coins by market cap (page {})...", per_page, page);

    let params = [
      ("vs_currency", VS_CURRENCY.to_string()),
      ("order", "market_cap_desc".to_string()),
      ("per_page", per_page.to_string()),
      ("page", page.to_string()),
      ("sparkline", "false".to_string()),
    ];
    let response = self.core.get(Endpoint::CoinsMarkets, &params).await?;
    response.json()
  }
}
