//! Domain types shared across the workspace

pub mod asset;
pub mod sample;

pub use asset::{AssetRecord, AssetStatus, ListedAsset};
pub use sample::MarketSample;
