use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::dsl::max;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel::upsert::excluded;
use ms_core::MarketSample;
use std::str::FromStr;

use crate::schema::market_data;

/// Rows per INSERT statement
pub const DEFAULT_BATCH_SIZE: usize = 1000;

const CREATE_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS market_data (
    id SERIAL PRIMARY KEY,
    coin_id VARCHAR(255) NOT NULL,
    symbol VARCHAR(50) NOT NULL,
    price NUMERIC,
    market_cap NUMERIC,
    volume_24h NUMERIC,
    timestamp TIMESTAMPTZ NOT NULL,
    UNIQUE (coin_id, timestamp)
);
CREATE INDEX IF NOT EXISTS idx_timestamp ON market_data (timestamp);
"#;

const DROP_SCHEMA_SQL: &str = "DROP TABLE IF EXISTS market_data;";

/// How long rows are kept and how they are batched on the way in
#[derive(Debug, Clone, PartialEq)]
pub struct RetentionConfig {
  pub days: i64,
  pub batch_size: usize,
}

impl Default for RetentionConfig {
  fn default() -> Self {
    Self { days: 60, batch_size: DEFAULT_BATCH_SIZE }
  }
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = market_data)]
pub struct MarketData {
  pub id: i32,
  pub coin_id: String,
  pub symbol: String,
  pub price: Option<BigDecimal>,
  pub market_cap: Option<BigDecimal>,
  pub volume_24h: Option<BigDecimal>,
  pub observed_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = market_data)]
pub struct NewMarketData {
  pub coin_id: String,
  pub symbol: String,
  pub price: Option<BigDecimal>,
  pub market_cap: Option<BigDecimal>,
  pub volume_24h: Option<BigDecimal>,
  pub observed_at: DateTime<Utc>,
}

/// Output of [`MarketData::stats`]
#[derive(Debug, Clone)]
pub struct MarketDataStats {
  pub total: i64,
  pub latest: Option<DateTime<Utc>>,
  pub top_by_market_cap: Vec<MarketData>,
}

fn to_decimal(value: f64) -> Option<BigDecimal> {
  BigDecimal::from_str(&value.to_string()).ok()
}

impl From<&MarketSample> for NewMarketData {
  fn from(sample: &MarketSample) -> Self {
    Self {
      coin_id: sample.asset_id.clone(),
      symbol: sample.symbol.clone(),
      price: to_decimal(sample.price),
      market_cap: to_decimal(sample.market_cap),
      volume_24h: to_decimal(sample.volume_24h),
      observed_at: sample.observed_at,
    }
  }
}

impl NewMarketData {
  /// Insert rows, overwriting price, market cap and volume when
  /// `(coin_id, timestamp)` already exists. All chunks commit together.
  ///
  /// Rows within one call must have distinct keys.
  pub fn upsert_batch(
    conn: &mut PgConnection,
    records: &[Self],
    batch_size: usize,
  ) -> Result<usize, DieselError> {
    use crate::schema::market_data::dsl::*;

    if records.is_empty() {
      return Ok(0);
    }

    conn.transaction::<_, DieselError, _>(|conn| {
      let mut total = 0;
      for chunk in records.chunks(batch_size.max(1)) {
        total += diesel::insert_into(market_data)
          .values(chunk)
          .on_conflict((coin_id, observed_at))
          .do_update()
          .set((
            price.eq(excluded(price)),
            market_cap.eq(excluded(market_cap)),
            volume_24h.eq(excluded(volume_24h)),
          ))
          .execute(conn)?;
      }
      log::info!("Batch loaded: {} records upserted", total);
      Ok(total)
    })
  }
}

impl MarketData {
  /// Idempotent table and index creation
  pub fn init_schema(conn: &mut PgConnection) -> Result<(), DieselError> {
    conn.batch_execute(CREATE_SCHEMA_SQL)
  }

  /// Drop the table and create it again, empty.
  pub fn reset_schema(conn: &mut PgConnection) -> Result<(), DieselError> {
    conn.batch_execute(DROP_SCHEMA_SQL)?;
    log::warn!("Table market_data dropped");
    Self::init_schema(conn)
  }

  /// Delete rows observed more than `days` days ago.
  pub fn enforce_retention(conn: &mut PgConnection, days: i64) -> Result<usize, DieselError> {
    use crate::schema::market_data::dsl::*;

    let cutoff = Utc::now() - chrono::Duration::days(days);
    let deleted = diesel::delete(market_data.filter(observed_at.lt(cutoff))).execute(conn)?;
    if deleted > 0 {
      log::info!("Retention policy: purged {} records older than {} days", deleted, days);
    }
    Ok(deleted)
  }

  pub fn count(conn: &mut PgConnection) -> Result<i64, DieselError> {
    use crate::schema::market_data::dsl::*;

    market_data.count().get_result(conn)
  }

  pub fn latest_timestamp(conn: &mut PgConnection) -> Result<Option<DateTime<Utc>>, DieselError> {
    use crate::schema::market_data::dsl::*;

    market_data.select(max(observed_at)).first(conn)
  }

  pub fn top_by_market_cap(conn: &mut PgConnection, limit: i64) -> Result<Vec<Self>, DieselError> {
    use crate::schema::market_data::dsl::*;

    market_data
      .order(market_cap.desc().nulls_last())
      .limit(limit)
      .select(MarketData::as_select())
      .load(conn)
  }

  /// Row count, freshness and the `top` largest rows by market cap.
  pub fn stats(conn: &mut PgConnection, top: i64) -> Result<MarketDataStats, DieselError> {
    let total = Self::count(conn)?;
    if total == 0 {
      return Ok(MarketDataStats { total, latest: None, top_by_market_cap: Vec::new() });
    }
    Ok(MarketDataStats {
      total,
      latest: Self::latest_timestamp(conn)?,
      top_by_market_cap: Self::top_by_market_cap(conn, top)?,
    })
  }
}
