use crate::commands::print_separator;
use crate::config::Config;
use anyhow::{bail, Context, Result};
use bigdecimal::BigDecimal;
use clap::Subcommand;
use ms_database_postgres::{connect_and_init, MarketData};
use std::io::{self, BufRead, Write};

#[derive(Subcommand, Debug)]
pub enum DbCommands {
  /// Row count, freshness and the largest assets by market cap
  Verify {
    /// Number of rows to show
    #[arg(short, long, default_value = "5")]
    top: i64,
  },

  /// Drop and recreate the market_data table
  Reset {
    /// Skip the confirmation prompt
    #[arg(long)]
    force: bool,
  },

  /// Delete rows older than the retention window
  Prune,
}

pub async fn execute(cmd: DbCommands, config: Config) -> Result<()> {
  let mut conn =
    connect_and_init(config.require_database_url()?).context("Failed to connect to database")?;

  match cmd {
    DbCommands::Verify { top } => {
      println!("DIAGNOSTIC: Database State Verification");
      print_separator('-', 40);
      let stats = MarketData::stats(&mut conn, top)?;
      println!("Total Records:   {}", stats.total);
      match stats.latest {
        Some(latest) => {
          println!("Latest Update:   {} (UTC)", latest.format("%Y-%m-%d %H:%M:%S"));
          print_separator('-', 40);
          println!("Top {} Assets by Market Cap:", top);
          println!(
            "{:<8} {:>16} {:>22} {:>20}  {}",
            "symbol", "price", "market_cap", "volume_24h", "timestamp"
          );
          for row in &stats.top_by_market_cap {
            println!(
              "{:<8} {:>16} {:>22} {:>20}  {}",
              row.symbol.to_uppercase(),
              decimal(&row.price),
              decimal(&row.market_cap),
              decimal(&row.volume_24h),
              row.observed_at.format("%Y-%m-%d %H:%M:%S")
            );
          }
        }
        None => println!("Database is empty."),
      }
      print_separator('-', 40);
    }
    DbCommands::Reset { force } => {
      println!("DANGER ZONE: This will wipe ALL data from 'market_data'.");
      if !force && !confirm("Are you sure? Type 'DELETE' to confirm: ")? {
        bail!("Operation cancelled");
      }
      MarketData::reset_schema(&mut conn)?;
      println!("Table 'market_data' has been dropped and recreated.");
    }
    DbCommands::Prune => {
      let deleted = MarketData::enforce_retention(&mut conn, config.retention.days)?;
      println!("Purged {} records older than {} days", deleted, config.retention.days);
    }
  }

  Ok(())
}

fn decimal(value: &Option<BigDecimal>) -> String {
  value.as_ref().map(|v| v.round(2).to_string()).unwrap_or_else(|| "-".to_string())
}

fn confirm(prompt: &str) -> Result<bool> {
  print!("{}", prompt);
  io::stdout().flush()?;
  let mut answer = String::new();
  io::stdin().lock().read_line(&mut answer)?;
  Ok(answer.trim() == "DELETE")
}
