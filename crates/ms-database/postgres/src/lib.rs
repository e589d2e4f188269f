/*
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 */

pub mod connection;
pub mod models;
pub mod schema;

// Re-export commonly used items
pub use connection::{connect_and_init, establish_connection, DatabaseError};
pub use diesel::prelude::*;
pub use models::market_data::{
  MarketData, MarketDataStats, NewMarketData, RetentionConfig, DEFAULT_BATCH_SIZE,
};
