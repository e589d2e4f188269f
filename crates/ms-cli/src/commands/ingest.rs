/*
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 */

use crate::budget::{self, UsageLog};
use crate::commands::{print_header, print_separator};
use crate::config::{Config, IngestDefaults, Mode};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Local, Utc};
use clap::Args;
use ms_client::{CoinGeckoClient, RetryPolicy};
use ms_core::MarketSample;
use ms_database_postgres::{connect_and_init, MarketData, NewMarketData, PgConnection};
use ms_loaders::{
  BatchFetcher, IngestPipeline, IngestSummary, LoaderError, LoaderResult, PipelineConfig,
  Registry, SampleSink, TargetSelection,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

#[derive(Args, Debug)]
pub struct IngestArgs {
  /// Execution mode [default: ingest, or the config file's value]
  #[arg(short, long, value_enum)]
  mode: Option<Mode>,

  /// Number of assets to process when no targets are given [default: 500]
  #[arg(short, long)]
  limit: Option<usize>,

  /// Comma-separated symbols or names (e.g. BTC,ETH), bypasses top-N selection
  #[arg(short, long)]
  targets: Option<String>,

  /// File supplying defaults for the flags above
  #[arg(long, default_value = "ingest_config.json")]
  config_file: PathBuf,
}

/// Flags merged over the config file
#[derive(Debug, Clone, PartialEq)]
struct RunPlan {
  mode: Mode,
  selection: TargetSelection,
}

impl RunPlan {
  fn new(args: &IngestArgs, defaults: IngestDefaults) -> Self {
    let mode = args.mode.unwrap_or(defaults.mode);
    let limit = args.limit.unwrap_or(defaults.limit);
    let targets = args.targets.clone().or(defaults.targets);

    let selection = match targets.as_deref().map(split_targets) {
      Some(terms) if !terms.is_empty() => TargetSelection::Explicit(terms),
      _ => TargetSelection::Top(limit),
    };
    Self { mode, selection }
  }
}

fn split_targets(raw: &str) -> Vec<String> {
  raw.split(',').map(str::trim).filter(|t| !t.is_empty()).map(String::from).collect()
}

/// Upserts every chunk as it arrives.
struct PgSampleSink {
  conn: PgConnection,
  batch_size: usize,
}

#[async_trait]
impl SampleSink for PgSampleSink {
  async fn write(&mut self, samples: &[MarketSample]) -> LoaderResult<usize> {
    let rows: Vec<NewMarketData> = samples.iter().map(NewMarketData::from).collect();
    let written = NewMarketData::upsert_batch(&mut self.conn, &rows, self.batch_size)
      .map_err(|e| LoaderError::Sink(e.to_string()))?;
    println!("  [OK] Upserted {} records", written);
    Ok(written)
  }
}

/// Prints one sample per chunk instead of writing.
#[derive(Default)]
struct DryRunSink {
  chunks: usize,
}

#[async_trait]
impl SampleSink for DryRunSink {
  async fn write(&mut self, samples: &[MarketSample]) -> LoaderResult<usize> {
    self.chunks += 1;
    println!("  [OK] Chunk {}: {} records ready.", self.chunks, samples.len());
    if let Some(sample) = samples.first() {
      println!("      Sample: {}", describe_sample(sample));
    }
    Ok(samples.len())
  }
}

fn describe_sample(sample: &MarketSample) -> String {
  format!(
    "{:<6} | ${:.2} | Cap: ${:.1}B | {}",
    sample.symbol.to_uppercase(),
    sample.price,
    sample.market_cap / 1e9,
    sample.observed_at.format("%H:%M:%S")
  )
}

pub async fn execute(args: IngestArgs, config: Config) -> Result<()> {
  let started_at = Utc::now();
  let timer = Instant::now();
  let plan = RunPlan::new(&args, IngestDefaults::load(&args.config_file));

  print_header("Market Sentinel: Crypto ETL Pipeline");
  println!("  Mode:       {}", plan.mode.to_string().to_uppercase());
  println!("  Start Time: {}", Local::now().format("%H:%M:%S"));
  print_separator('-', 70);

  // Connect before touching the API so a bad DATABASE_URL fails fast
  let mut pg_sink = match plan.mode {
    Mode::Ingest => {
      println!("  [*] Initializing Database...");
      let conn = connect_and_init(config.require_database_url()?)
        .context("Failed to initialize database")?;
      Some(PgSampleSink { conn, batch_size: config.retention.batch_size })
    }
    Mode::DryRun => None,
  };

  let client = Arc::new(CoinGeckoClient::new(config.api.clone())?);

  println!("  [*] Syncing Coin Registry...");
  let registry_timer = Instant::now();
  let mut registry = Registry::open(config.registry.clone());
  let known = registry.load(client.as_ref()).await;
  println!(
    "  [+] Registry Synced in {:.2}s ({} coins)",
    registry_timer.elapsed().as_secs_f64(),
    known
  );

  match &plan.selection {
    TargetSelection::Explicit(terms) => {
      println!("  [+] Targeting {} specific assets: {}", terms.len(), terms.join(","))
    }
    TargetSelection::Top(n) => println!("  [+] Targeting Top {} assets by Market Cap.", n),
  }
  print_separator('-', 70);

  let pipeline = IngestPipeline::new(
    BatchFetcher::new(client.clone(), RetryPolicy::default()),
    PipelineConfig::default(),
  );

  let outcome = match pg_sink.as_mut() {
    Some(sink) => pipeline.run(&mut registry, &plan.selection, sink).await,
    None => pipeline.run(&mut registry, &plan.selection, &mut DryRunSink::default()).await,
  };

  let summary = match outcome {
    Ok(summary) => summary,
    Err(e) => {
      report_abort(&e);
      return Err(e).context("Ingestion run aborted");
    }
  };
  report_plan(&summary);

  if let Some(sink) = pg_sink.as_mut() {
    print_separator('-', 70);
    let purged = MarketData::enforce_retention(&mut sink.conn, config.retention.days)
      .context("Retention policy failed")?;
    if purged > 0 {
      println!("  Retention Policy: Purged {} old records (>{} days).", purged, config.retention.days);
    }
  }

  print_separator('=', 70);
  println!("  DONE. Total Cycle Time: {:.2}s", timer.elapsed().as_secs_f64());
  if plan.mode == Mode::Ingest {
    println!("  Total Records Upserted: {}", summary.samples_written);
  }
  print_separator('=', 70);

  if plan.mode == Mode::Ingest {
    let usage = UsageLog::new(&config.usage_log_file);
    match usage.record_run(started_at, Utc::now()) {
      Ok(_) => {
        if let Some(status) = usage.status(Utc::now()) {
          budget::print_status(&status);
        }
      }
      Err(e) => error!("Could not update usage log: {:#}", e),
    }
  }

  Ok(())
}

fn report_plan(summary: &IngestSummary) {
  if summary.inactive_skipped > 0 {
    println!("  [-] Filtered {} inactive 'Ghost' coins.", summary.inactive_skipped);
  }
  if !summary.unresolved.is_empty() {
    println!("  [-] Could not resolve: {}", summary.unresolved.join(", "));
  }
  println!(
    "  [+] Processed {} assets in {} chunks ({} without data, {} unchanged chunks).",
    summary.targets, summary.chunks, summary.assets_failed, summary.chunks_not_modified
  );
}

fn report_abort(err: &LoaderError) {
  match err {
    LoaderError::Aborted { chunk, source, written, .. } => {
      println!();
      println!("  [x] CRITICAL: Circuit Breaker Tripped on Chunk {}.", chunk);
      println!("      Reason: {}", source);
      println!("      Diagnostic: {}", source.diagnostic());
      println!("      Records already upserted: {}", written);
    }
    other => println!("  [x] CRITICAL: {}", other),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn args(mode: Option<Mode>, limit: Option<usize>, targets: Option<&str>) -> IngestArgs {
    IngestArgs {
      mode,
      limit,
      targets: targets.map(String::from),
      config_file: PathBuf::from("ingest_config.json"),
    }
  }

  #[test]
  fn test_plan_defaults_to_top_n() {
    let plan = RunPlan::new(&args(None, None, None), IngestDefaults::default());
    assert_eq!(plan.mode, Mode::Ingest);
    assert_eq!(plan.selection, TargetSelection::Top(500));
  }

  #[test]
  fn test_flags_override_config_file() {
    let defaults =
      IngestDefaults { mode: Mode::DryRun, limit: 50, targets: Some("BTC,ETH".to_string()) };

    let plan = RunPlan::new(&args(Some(Mode::Ingest), Some(10), Some(" sol , ada,")), defaults);
    assert_eq!(plan.mode, Mode::Ingest);
    assert_eq!(
      plan.selection,
      TargetSelection::Explicit(vec!["sol".to_string(), "ada".to_string()])
    );
  }

  #[test]
  fn test_config_file_targets_used_without_flags() {
    let defaults =
      IngestDefaults { mode: Mode::DryRun, limit: 50, targets: Some("BTC,ETH".to_string()) };
    let plan = RunPlan::new(&args(None, None, None), defaults);
    assert_eq!(plan.mode, Mode::DryRun);
    assert_eq!(
      plan.selection,
      TargetSelection::Explicit(vec!["BTC".to_string(), "ETH".to_string()])
    );
  }

  #[test]
  fn test_blank_targets_fall_back_to_limit() {
    let plan = RunPlan::new(&args(None, Some(25), Some(" , ")), IngestDefaults::default());
    assert_eq!(plan.selection, TargetSelection::Top(25));
  }

  #[test]
  fn test_describe_sample() {
    let sample = MarketSample {
      asset_id: "bitcoin".to_string(),
      symbol: "btc".to_string(),
      price: 95000.0,
      market_cap: 1.85e12,
      volume_24h: 3.0e10,
      observed_at: Utc.with_ymd_and_hms(2025, 1, 2, 13, 45, 9).unwrap(),
    };
    assert_eq!(describe_sample(&sample), "BTC    | $95000.00 | Cap: $1850.0B | 13:45:09");
  }

  #[tokio::test]
  async fn test_dry_run_sink_counts_without_writing() {
    let mut sink = DryRunSink::default();
    assert_eq!(sink.write(&[]).await.unwrap(), 0);
    assert_eq!(sink.chunks, 1);
  }
}
