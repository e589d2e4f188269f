use thiserror::Error;

/// The main error type for ms-* crates
#[derive(Error, Debug)]
pub enum Error {
  /// Environment variable error
  #[error("Environment variable error: {0}")]
  EnvVar(#[from] std::env::VarError),

  /// Configuration error
  #[error("Configuration error: {0}")]
  Config(String),

  /// Serialization/Deserialization error
  #[error("Serialization error: {0}")]
  Serde(#[from] serde_json::Error),

  /// Network-level failure (timeout, connection reset, DNS)
  #[error("HTTP transport error: {0}")]
  Transport(String),

  /// Upstream answered with a 4xx/5xx status
  #[error("{0}")]
  Api(ApiFailure),

  /// Response body could not be decoded
  #[error("Parse error: {0}")]
  Parse(String),

  /// General unexpected error
  #[error("Unexpected error: {0}")]
  Unexpected(String),
}

impl Error {
  /// Whether the failure class is worth another attempt.
  pub fn is_transient(&self) -> bool {
    match self {
      Error::Transport(_) => true,
      Error::Api(failure) => failure.kind.is_transient(),
      _ => false,
    }
  }
}

/// Classification of HTTP error statuses returned by CoinGecko.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
  BadRequest,
  Unauthorized,
  /// Endpoint or parameter not available on the current plan
  PlanRestricted,
  RequestTimeout,
  /// Id list too long for the request URL
  RequestTooLarge,
  RateLimited,
  ServerError,
  Other,
}

impl ApiErrorKind {
  pub fn from_status(status: u16) -> Self {
    match status {
      400 => ApiErrorKind::BadRequest,
      401 => ApiErrorKind::Unauthorized,
      403 => ApiErrorKind::PlanRestricted,
      408 => ApiErrorKind::RequestTimeout,
      414 => ApiErrorKind::RequestTooLarge,
      429 => ApiErrorKind::RateLimited,
      500..=599 => ApiErrorKind::ServerError,
      _ => ApiErrorKind::Other,
    }
  }

  pub fn is_transient(&self) -> bool {
    matches!(
      self,
      ApiErrorKind::RequestTimeout | ApiErrorKind::RateLimited | ApiErrorKind::ServerError
    )
  }

  /// Operator-facing hint for the failure.
  pub fn diagnostic(&self) -> &'static str {
    match self {
      ApiErrorKind::BadRequest => "Check parameters or syntax.",
      ApiErrorKind::Unauthorized => "Invalid or missing API key (Error 10002).",
      ApiErrorKind::PlanRestricted => {
        "Endpoint requires a paid plan. Disable this feature or upgrade the key."
      }
      ApiErrorKind::RequestTimeout => "Upstream timed out reading the request. Retrying...",
      ApiErrorKind::RequestTooLarge => {
        "Keep ID strings under 2,000 characters (reduce the chunk size)."
      }
      ApiErrorKind::RateLimited => "Rate limit hit. Handling via backoff.",
      ApiErrorKind::ServerError => "Server error. Retrying...",
      ApiErrorKind::Other => "Unexpected status from upstream.",
    }
  }
}

/// A non-success HTTP answer from the upstream API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure {
  pub status: u16,
  pub kind: ApiErrorKind,
  /// Message extracted from the error body, or the raw body
  pub message: String,
  /// `Retry-After` header in seconds, when the upstream sent one
  pub retry_after: Option<u64>,
}

impl ApiFailure {
  pub fn new(status: u16, message: impl Into<String>, retry_after: Option<u64>) -> Self {
    Self { status, kind: ApiErrorKind::from_status(status), message: message.into(), retry_after }
  }
}

impl std::fmt::Display for ApiFailure {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "API error {}: {} ({})", self.status, self.message, self.kind.diagnostic())?;
    if let Some(secs) = self.retry_after {
      write!(f, " Retry-After: {}s", secs)?;
    }
    Ok(())
  }
}

/// Result type alias for ms-* crates
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_status_classification() {
    assert_eq!(ApiErrorKind::from_status(400), ApiErrorKind::BadRequest);
    assert_eq!(ApiErrorKind::from_status(401), ApiErrorKind::Unauthorized);
    assert_eq!(ApiErrorKind::from_status(403), ApiErrorKind::PlanRestricted);
    assert_eq!(ApiErrorKind::from_status(414), ApiErrorKind::RequestTooLarge);
    assert_eq!(ApiErrorKind::from_status(429), ApiErrorKind::RateLimited);
    assert_eq!(ApiErrorKind::from_status(503), ApiErrorKind::ServerError);
    assert_eq!(ApiErrorKind::from_status(418), ApiErrorKind::Other);
  }

  #[test]
  fn test_transient_classes() {
    assert!(Error::Transport("timed out".to_string()).is_transient());
    assert!(Error::Api(ApiFailure::new(429, "slow down", Some(60))).is_transient());
    assert!(Error::Api(ApiFailure::new(500, "boom", None)).is_transient());
    assert!(!Error::Api(ApiFailure::new(401, "bad key", None)).is_transient());
    assert!(!Error::Api(ApiFailure::new(414, "too long", None)).is_transient());
    assert!(!Error::Parse("bad json".to_string()).is_transient());
  }

  #[test]
  fn test_diagnostics_are_distinct() {
    let rate = ApiErrorKind::RateLimited.diagnostic();
    let auth = ApiErrorKind::Unauthorized.diagnostic();
    let server = ApiErrorKind::ServerError.diagnostic();
    assert_ne!(rate, auth);
    assert_ne!(auth, server);
    assert_ne!(rate, server);
  }

  #[test]
  fn test_failure_display_includes_retry_hint() {
    let failure = ApiFailure::new(429, "Too many requests", Some(30));
    let text = failure.to_string();
    assert!(text.contains("429"));
    assert!(text.contains("Retry-After: 30s"));
  }
}
