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

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

mod budget;
mod commands;
mod config;

use commands::{db::DbCommands, ingest::IngestArgs, registry::RegistryCommands};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "sentinel")]
#[command(propagate_version = true)]
struct Cli {
  #[command(subcommand)]
  command: Commands,

  /// Verbose output
  #[arg(short, long, global = true)]
  verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Fetch, validate and store prices for the selected assets
  Ingest(IngestArgs),
  /// Inspect or refresh the asset registry
  Registry {
    #[command(subcommand)]
    cmd: RegistryCommands,
  },
  /// Database maintenance and diagnostics
  Db {
    #[command(subcommand)]
    cmd: DbCommands,
  },
  /// Month-to-date compute usage estimate
  Budget,
}

#[tokio::main]
async fn main() -> Result<()> {
  // Load environment variables
  dotenv().ok();

  // Parse CLI arguments
  let cli = Cli::parse();

  // Initialize logging; RUST_LOG wins over --verbose
  let log_level = if cli.verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
  tracing_subscriber::fmt().with_env_filter(filter).init();

  // Load configuration
  let config = config::Config::from_env()?;

  // Execute command
  match cli.command {
    Commands::Ingest(args) => commands::ingest::execute(args, config).await?,
    Commands::Registry { cmd } => commands::registry::execute(cmd, config).await?,
    Commands::Db { cmd } => commands::db::execute(cmd, config).await?,
    Commands::Budget => {
      let usage = budget::UsageLog::new(&config.usage_log_file);
      match usage.status(chrono::Utc::now()) {
        Some(status) => budget::print_status(&status),
        None => println!("No ingest runs logged in {}", config.usage_log_file.display()),
      }
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::CommandFactory;

  #[test]
  fn test_cli_definition_is_valid() {
    Cli::command().debug_assert();
  }

  #[test]
  fn test_parse_dry_run_with_targets() {
    let argv = ["sentinel", "ingest", "--mode", "dry-run", "--targets", "BTC,ETH"];
    let cli = Cli::try_parse_from(argv).unwrap();
    match cli.command {
      Commands::Ingest(_) => {}
      other => panic!("Expected ingest, got {:?}", other),
    }
  }

  #[test]
  fn test_parse_registry_matches() {
    let cli = Cli::try_parse_from(["sentinel", "-v", "registry", "matches", "btc"]).unwrap();
    assert!(cli.verbose);
    assert!(matches!(
      cli.command,
      Commands::Registry { cmd: RegistryCommands::Matches { ref symbol } } if symbol == "btc"
    ));
  }

  #[test]
  fn test_parse_registry_sync_and_inactive() {
    let cli = Cli::try_parse_from(["sentinel", "registry", "sync"]).unwrap();
    assert!(matches!(cli.command, Commands::Registry { cmd: RegistryCommands::Sync }));
    let cli = Cli::try_parse_from(["sentinel", "registry", "inactive"]).unwrap();
    assert!(matches!(cli.command, Commands::Registry { cmd: RegistryCommands::Inactive }));
  }

  #[test]
  fn test_unknown_mode_rejected() {
    assert!(Cli::try_parse_from(["sentinel", "ingest", "--mode", "live"]).is_err());
  }
}
