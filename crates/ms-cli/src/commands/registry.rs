use crate::commands::print_separator;
use crate::config::Config;
use anyhow::Result;
use clap::Subcommand;
use ms_client::CoinGeckoClient;
use ms_loaders::Registry;

#[derive(Subcommand, Debug)]
pub enum RegistryCommands {
  /// Resolve symbols or names to canonical asset ids
  Resolve {
    /// Terms to resolve (e.g. BTC ethereum sol)
    #[arg(required = true)]
    terms: Vec<String>,
  },

  /// List every asset sharing a ticker
  Matches {
    symbol: String,
  },

  /// Rebuild the registry from upstream regardless of its age
  Sync,

  /// List assets currently suppressed after repeated failures
  Inactive,
}

pub async fn execute(cmd: RegistryCommands, config: Config) -> Result<()> {
  let client = CoinGeckoClient::new(config.api.clone())?;
  let mut registry = Registry::open(config.registry.clone());

  match cmd {
    RegistryCommands::Sync => {
      let count = registry.rebuild(&client).await;
      println!("Registry rebuilt with {} coins -> {}", count, config.registry.path.display());
    }
    RegistryCommands::Resolve { terms } => {
      registry.load(&client).await;
      print_resolutions(&registry, &terms);
    }
    RegistryCommands::Matches { symbol } => {
      registry.load(&client).await;
      print_matches(&registry, &symbol);
    }
    RegistryCommands::Inactive => {
      registry.load(&client).await;
      print_inactive(&registry);
    }
  }

  Ok(())
}

fn print_resolutions(registry: &Registry, terms: &[String]) {
  for term in terms {
    match registry.resolve(term) {
      Some(id) => println!("{:<12} -> {}", term, id),
      None => println!("{:<12} -> (not found)", term),
    }
  }
}

fn print_matches(registry: &Registry, symbol: &str) {
  let matches = registry.find_all(symbol);
  println!("--- All matches for symbol: '{}' ---", symbol.to_uppercase());
  if matches.is_empty() {
    println!("No matches found.");
  } else {
    println!("Found {} matches:", matches.len());
    for coin in matches {
      println!("ID: {:<30} | Name: {}", coin.id, coin.name);
    }
  }
  print_separator('-', 50);
}

fn print_inactive(registry: &Registry) {
  let lines = inactive_lines(registry);
  println!("{} inactive of {} coins", lines.len(), registry.len());
  for line in lines {
    println!("{}", line);
  }
}

fn inactive_lines(registry: &Registry) -> Vec<String> {
  registry
    .records()
    .iter()
    .filter(|r| !r.is_active())
    .map(|coin| format!("ID: {:<30} | Failures: {}", coin.id, coin.failure_count))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use ms_core::{AssetRecord, AssetStatus};
  use ms_loaders::{MemoryStore, RegistryConfig};
  use std::time::Duration;

  #[test]
  fn test_inactive_lines_lists_suppressed_coins_only() {
    let mut ghost = AssetRecord::new("ghost", "boo", "Ghost");
    ghost.status = AssetStatus::Inactive;
    ghost.failure_count = 3;
    let store = MemoryStore::with_snapshot(
      vec![AssetRecord::new("bitcoin", "btc", "Bitcoin"), ghost],
      Duration::from_secs(60),
    );
    let mut registry = Registry::with_store(RegistryConfig::default(), Box::new(store));
    registry.load_cached().unwrap();

    let lines = inactive_lines(&registry);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("ID: ghost "));
    assert!(lines[0].ends_with("| Failures: 3"));
  }
}
