/*
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 */

use ms_core::{ApiErrorKind, ApiFailure};
use thiserror::Error;

/// Failures reading or writing the registry snapshot.
#[derive(Error, Debug)]
pub enum RegistryError {
  #[error("Snapshot IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Snapshot serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// Terminal outcome of fetching one chunk.
#[derive(Error, Debug)]
pub enum FetchError {
  /// Every attempt failed with a transient error
  #[error("Gave up after {attempts} attempts: {source}")]
  Exhausted { attempts: u32, source: ms_core::Error },

  /// The upstream refused the request; retrying would not help
  #[error("Request rejected: {0}")]
  Rejected(ApiFailure),

  #[error("Undecodable response: {0}")]
  Decode(String),
}

impl FetchError {
  /// Operator hint distinguishing rate limiting, auth and server trouble.
  pub fn diagnostic(&self) -> &'static str {
    match self {
      FetchError::Rejected(failure) => failure.kind.diagnostic(),
      FetchError::Exhausted { source: ms_core::Error::Api(failure), .. } => match failure.kind {
        ApiErrorKind::RateLimited => {
          "Rate limit still exceeded after backoff. Lower the request rate or wait."
        }
        ApiErrorKind::ServerError => "Upstream kept failing with server errors. Try again later.",
        kind => kind.diagnostic(),
      },
      FetchError::Exhausted { .. } => "Network failures on every attempt. Check connectivity.",
      FetchError::Decode(_) => "Upstream response format changed or was truncated.",
    }
  }
}

#[derive(Error, Debug)]
pub enum LoaderError {
  /// A chunk could not be fetched; earlier chunks are already persisted
  #[error("Run aborted at chunk {chunk}/{chunks} after writing {written} samples: {source}")]
  Aborted { chunk: usize, chunks: usize, written: usize, source: FetchError },

  #[error("Sink error: {0}")]
  Sink(String),
}

pub type LoaderResult<T> = Result<T, LoaderError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_exhausted_display_keeps_cause() {
    let err = FetchError::Exhausted {
      attempts: 5,
      source: ms_core::Error::Api(ApiFailure::new(503, "maintenance", None)),
    };
    let text = err.to_string();
    assert!(text.contains("5 attempts"));
    assert!(text.contains("503"));
  }

  #[test]
  fn test_diagnostics_distinguish_failure_classes() {
    let rate = FetchError::Exhausted {
      attempts: 5,
      source: ms_core::Error::Api(ApiFailure::new(429, "slow down", Some(60))),
    };
    let server = FetchError::Exhausted {
      attempts: 5,
      source: ms_core::Error::Api(ApiFailure::new(500, "boom", None)),
    };
    let auth = FetchError::Rejected(ApiFailure::new(401, "bad key", None));

    assert!(rate.diagnostic().contains("Rate limit"));
    assert!(server.diagnostic().contains("server errors"));
    assert_eq!(auth.diagnostic(), ApiErrorKind::Unauthorized.diagnostic());
  }

  #[test]
  fn test_aborted_display() {
    let err = LoaderError::Aborted {
      chunk: 2,
      chunks: 3,
      written: 500,
      source: FetchError::Decode("eof".to_string()),
    };
    assert_eq!(
      err.to_string(),
      "Run aborted at chunk 2/3 after writing 500 samples: Undecodable response: eof"
    );
  }

  #[test]
  fn test_registry_error_from_io() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
    let err = RegistryError::from(io_err);
    assert!(matches!(err, RegistryError::Io(_)));
    assert_eq!(err.to_string(), "Snapshot IO error: read-only");
  }
}
