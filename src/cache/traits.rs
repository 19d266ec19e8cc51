//! Core traits and types for the query cache.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Source of the current time for freshness and eviction decisions.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// Clock that only moves when told to.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct ManualClock {
  now: Arc<std::sync::Mutex<DateTime<Utc>>>,
}

#[cfg(test)]
impl ManualClock {
  pub fn new() -> Self {
    Self {
      now: Arc::new(std::sync::Mutex::new(Utc::now())),
    }
  }

  pub fn advance(&self, by: chrono::Duration) {
    *self.now.lock().unwrap() += by;
  }
}

#[cfg(test)]
impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    *self.now.lock().unwrap()
  }
}

/// Why a fetch failed. Stored on the cache entry rather than returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
  /// The server answered with a non-success status.
  #[error("request to {url} failed with status {status}")]
  Status { status: u16, url: String },

  #[error("transport error: {0}")]
  Transport(String),

  /// The body could not be decoded.
  #[error("failed to parse response: {0}")]
  Parse(String),

  /// The fetch task ended without producing a result.
  #[error("fetch aborted: {0}")]
  Aborted(String),
}

impl FetchError {
  /// HTTP status, if the server answered at all.
  pub fn status(&self) -> Option<u16> {
    match self {
      FetchError::Status { status, .. } => Some(*status),
      _ => None,
    }
  }

  /// Whether repeating the same request could plausibly succeed.
  pub fn is_retryable(&self) -> bool {
    match self {
      FetchError::Transport(_) => true,
      FetchError::Status { status, .. } => *status >= 500 || *status == 429,
      FetchError::Parse(_) | FetchError::Aborted(_) => false,
    }
  }
}

/// Lifecycle state of a cache entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryStatus {
  /// Nothing has been requested yet
  #[default]
  Idle,
  /// A fetch is running
  Loading,
  /// The last fetch succeeded
  Success,
  /// The last fetch failed
  Error,
}

/// Snapshot of an entry as seen by subscribers.
///
/// `data` survives failed refetches, so a view can carry both the last good
/// value and the error that followed it.
#[derive(Debug)]
pub struct QueryView<T> {
  pub data: Option<Arc<T>>,
  pub status: QueryStatus,
  pub error: Option<FetchError>,
  pub is_stale: bool,
  pub last_fetched_at: Option<DateTime<Utc>>,
}

impl<T> QueryView<T> {
  pub fn is_loading(&self) -> bool {
    self.status == QueryStatus::Loading
  }

  pub fn data(&self) -> Option<&T> {
    self.data.as_deref()
  }

  pub fn error(&self) -> Option<&FetchError> {
    self.error.as_ref()
  }
}

impl<T> Clone for QueryView<T> {
  fn clone(&self) -> Self {
    Self {
      data: self.data.clone(),
      status: self.status,
      error: self.error.clone(),
      is_stale: self.is_stale,
      last_fetched_at: self.last_fetched_at,
    }
  }
}

impl<T> Default for QueryView<T> {
  fn default() -> Self {
    Self {
      data: None,
      status: QueryStatus::Idle,
      error: None,
      is_stale: false,
      last_fetched_at: None,
    }
  }
}

/// Callback invoked with the new view whenever an entry changes.
pub type Listener<T> = Box<dyn FnMut(&QueryView<T>) + Send>;
