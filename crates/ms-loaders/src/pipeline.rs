/*
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 */

//! One ingestion run: targets -> chunks -> fetch -> validate -> sink.

use crate::error::{LoaderError, LoaderResult};
use crate::fetcher::{chunk_ids, BatchFetcher, FetchOutcome, DEFAULT_CHUNK_SIZE};
use crate::registry::Registry;
use crate::transform::{Transformer, DEFAULT_MAX_PRICE};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use ms_core::MarketSample;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Run pacing and limits
#[derive(Debug, Clone)]
pub struct PipelineConfig {
  /// Ids per price request
  pub chunk_size: usize,

  /// Idle time between chunks
  pub chunk_pause: Duration,

  /// Prices above this are logged as suspicious
  pub max_price: f64,

  pub show_progress: bool,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      chunk_size: DEFAULT_CHUNK_SIZE,
      chunk_pause: Duration::from_secs(2),
      max_price: DEFAULT_MAX_PRICE,
      show_progress: true,
    }
  }
}

/// Which assets a run covers.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetSelection {
  /// First `n` registry entries (market-cap ranked prefix first)
  Top(usize),
  /// Free-text terms resolved through the registry
  Explicit(Vec<String>),
}

/// Destination for validated samples.
#[async_trait]
pub trait SampleSink: Send {
  /// Store one chunk's samples, returning how many rows were written.
  async fn write(&mut self, samples: &[MarketSample]) -> LoaderResult<usize>;
}

/// Counters for a finished run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestSummary {
  pub targets: usize,
  pub unresolved: Vec<String>,
  pub inactive_skipped: usize,
  pub chunks: usize,
  pub chunks_not_modified: usize,
  pub samples_written: usize,
  /// Requested assets that produced no sample
  pub assets_failed: usize,
}

pub struct IngestPipeline {
  fetcher: BatchFetcher,
  transformer: Transformer,
  config: PipelineConfig,
}

impl IngestPipeline {
  pub fn new(fetcher: BatchFetcher, config: PipelineConfig) -> Self {
    Self { fetcher, transformer: Transformer::new(config.max_price), config }
  }

  /// Resolve targets, drop inactive ones and work through them chunk by
  /// chunk. A chunk that cannot be fetched ends the run with
  /// [`LoaderError::Aborted`]; rows written before it stay written.
  pub async fn run(
    &self,
    registry: &mut Registry,
    selection: &TargetSelection,
    sink: &mut dyn SampleSink,
  ) -> LoaderResult<IngestSummary> {
    let mut summary = IngestSummary::default();

    let candidates = match selection {
      TargetSelection::Top(n) => registry.top(*n),
      TargetSelection::Explicit(terms) => {
        let resolution = registry.resolve_many(terms.as_slice());
        summary.unresolved = resolution.unresolved;
        resolution.resolved
      }
    };
    let candidates = dedup_preserving_order(candidates);

    let (active, inactive) = registry.filter_active(&candidates);
    if !inactive.is_empty() {
      info!("Skipping {} inactive assets: {:?}", inactive.len(), inactive);
    }
    summary.inactive_skipped = inactive.len();
    summary.targets = active.len();

    if active.is_empty() {
      warn!("No active targets to ingest");
      return Ok(summary);
    }

    let chunks = chunk_ids(&active, self.config.chunk_size);
    summary.chunks = chunks.len();
    info!("Ingesting {} assets in {} chunks", active.len(), chunks.len());

    let progress = self.progress_bar(chunks.len());

    for (idx, chunk) in chunks.iter().enumerate() {
      info!("Processing chunk {}/{} ({} coins)...", idx + 1, chunks.len(), chunk.len());

      let outcome = match self.fetcher.fetch(chunk).await {
        Ok(outcome) => outcome,
        Err(e) => {
          progress.abandon_with_message(format!("Failed at chunk {}", idx + 1));
          error!("CRITICAL: chunk {}/{} failed: {}", idx + 1, chunks.len(), e);
          error!("Diagnostic: {}", e.diagnostic());
          return Err(LoaderError::Aborted {
            chunk: idx + 1,
            chunks: chunks.len(),
            written: summary.samples_written,
            source: e,
          });
        }
      };

      if let Some(quota) = outcome.quota() {
        progress.set_message(format!("credits {}", quota));
      }

      match outcome {
        FetchOutcome::Data { payload, .. } => {
          let samples = self.transformer.transform(&payload, chunk, registry);
          summary.assets_failed += chunk.len().saturating_sub(samples.len());
          if !samples.is_empty() {
            summary.samples_written += sink.write(&samples).await?;
          }
        }
        FetchOutcome::NotModified { .. } => summary.chunks_not_modified += 1,
        FetchOutcome::Empty => {}
      }

      progress.inc(1);
      if idx + 1 < chunks.len() {
        sleep(self.config.chunk_pause).await;
      }
    }

    progress.finish_with_message(format!("{} samples", summary.samples_written));
    info!(
      "Ingestion complete: {} samples from {} assets ({} failed, {} chunks unchanged)",
      summary.samples_written, summary.targets, summary.assets_failed, summary.chunks_not_modified
    );
    Ok(summary)
  }

  fn progress_bar(&self, len: usize) -> ProgressBar {
    if !self.config.show_progress {
      return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
      .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>4}/{len:4} {msg}")
    {
      pb.set_style(style.progress_chars("##-"));
    }
    pb
  }
}

fn dedup_preserving_order(ids: Vec<String>) -> Vec<String> {
  let mut seen = HashSet::with_capacity(ids.len());
  ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
