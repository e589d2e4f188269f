use crate::models::market_data::MarketData;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
  #[error("Database connection failed: {0}")]
  Connection(#[from] diesel::ConnectionError),

  #[error("Database query failed: {0}")]
  Query(#[from] diesel::result::Error),
}

/// Establish a database connection
pub fn establish_connection(database_url: &str) -> Result<PgConnection, DatabaseError> {
  Ok(PgConnection::establish(database_url)?)
}

/// Connect and make sure the `market_data` table and its index exist.
/// Safe to call at the start of every run.
pub fn connect_and_init(database_url: &str) -> Result<PgConnection, DatabaseError> {
  let mut conn = establish_connection(database_url)?;
  MarketData::init_schema(&mut conn)?;
  log::info!("Database schema validated");
  Ok(conn)
}
