//! Month-to-date compute estimate for the database endpoint.
//!
//! Every ingest run appends an entry to a small JSON side file. The endpoint
//! keeps running for the autosuspend window after the last query, so that
//! window is billed on top of the run itself.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

pub const MONTHLY_QUOTA_CU_HOURS: f64 = 100.0;
pub const MIN_COMPUTE_CU: f64 = 0.25;
pub const AUTOSUSPEND_SECS: f64 = 5.0 * 60.0;
pub const MAX_ENTRIES: usize = 1000;
pub const WARN_PERCENT: f64 = 80.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEntry {
  pub timestamp: DateTime<Utc>,
  pub duration_sec: f64,
  pub billable_sec: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetStatus {
  pub active_hours: f64,
  pub cu_used: f64,
  pub percent_used: f64,
}

impl BudgetStatus {
  pub fn is_warning(&self) -> bool {
    self.percent_used > WARN_PERCENT
  }
}

pub struct UsageLog {
  path: PathBuf,
}

impl UsageLog {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// Logged runs, oldest first. A missing or corrupt file reads as empty.
  pub fn history(&self) -> Vec<RunEntry> {
    let Ok(content) = std::fs::read_to_string(&self.path) else {
      return Vec::new();
    };
    serde_json::from_str(&content).unwrap_or_else(|e| {
      warn!("Ignoring unreadable usage log {}: {}", self.path.display(), e);
      Vec::new()
    })
  }

  pub fn record_run(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<RunEntry> {
    let duration = (end - start).num_milliseconds().max(0) as f64 / 1000.0;
    let entry = RunEntry {
      timestamp: start,
      duration_sec: round2(duration),
      billable_sec: round2(duration + AUTOSUSPEND_SECS),
    };

    let mut history = self.history();
    history.push(entry.clone());
    if history.len() > MAX_ENTRIES {
      history.drain(..history.len() - MAX_ENTRIES);
    }

    let json = serde_json::to_string_pretty(&history)?;
    std::fs::write(&self.path, json)
      .with_context(|| format!("Failed to write usage log {}", self.path.display()))?;
    Ok(entry)
  }

  /// Usage for the calendar month containing `now`, or `None` with no runs.
  pub fn status(&self, now: DateTime<Utc>) -> Option<BudgetStatus> {
    let history = self.history();
    if history.is_empty() {
      return None;
    }
    let month_start = Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0).single()?;

    let billable: f64 =
      history.iter().filter(|run| run.timestamp >= month_start).map(|run| run.billable_sec).sum();
    let active_hours = billable / 3600.0;
    let cu_used = active_hours * MIN_COMPUTE_CU;

    Some(BudgetStatus {
      active_hours,
      cu_used,
      percent_used: cu_used / MONTHLY_QUOTA_CU_HOURS * 100.0,
    })
  }
}

pub fn print_status(status: &BudgetStatus) {
  println!();
  println!("  BUDGET ESTIMATE (Month-to-Date):");
  println!("   - Active Hours: {:.2} hrs", status.active_hours);
  println!("   - CU Usage:     {:.2} / {} CU-Hrs", status.cu_used, MONTHLY_QUOTA_CU_HOURS);
  println!("   - Status:       {:.1}% Used", status.percent_used);
  if status.is_warning() {
    println!("   WARNING: You are approaching your monthly limit!");
  }
}

fn round2(value: f64) -> f64 {
  (value * 100.0).round() / 100.0
}
