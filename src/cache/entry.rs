//! Cache entries and their subscribers.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use super::traits::{FetchError, Listener, QueryStatus, QueryView};
use crate::request::CacheKey;

/// Identifies one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub(super) u64);

struct Subscriber<T> {
  id: SubscriberId,
  listener: Listener<T>,
}

/// State stored for one cache key.
pub struct CacheEntry<T> {
  key: CacheKey,
  pub(super) data: Option<Arc<T>>,
  pub(super) status: QueryStatus,
  pub(super) error: Option<FetchError>,
  pub(super) last_fetched_at: Option<DateTime<Utc>>,
  /// Bumped by every invalidation
  pub(super) generation: u64,
  /// Generation the current data was fetched under
  pub(super) fetched_generation: u64,
  /// When the last subscriber left
  pub(super) idle_since: Option<DateTime<Utc>>,
  subscribers: Vec<Subscriber<T>>,
}

impl<T> CacheEntry<T> {
  pub(super) fn new(key: CacheKey) -> Self {
    Self {
      key,
      data: None,
      status: QueryStatus::Idle,
      error: None,
      last_fetched_at: None,
      generation: 0,
      fetched_generation: 0,
      idle_since: None,
      subscribers: Vec::new(),
    }
  }

  pub fn data(&self) -> Option<&T> {
    self.data.as_deref()
  }

  pub fn subscriber_count(&self) -> usize {
    self.subscribers.len()
  }

  pub fn is_invalidated(&self) -> bool {
    self.generation != self.fetched_generation
  }

  /// Fresh entries are served without fetching.
  pub fn is_fresh(&self, now: DateTime<Utc>, stale_time: Duration) -> bool {
    self.status == QueryStatus::Success
      && !self.is_invalidated()
      && self
        .last_fetched_at
        .is_some_and(|fetched| now - fetched < stale_time)
  }

  pub(super) fn is_evictable(&self, now: DateTime<Utc>, gc_time: Duration) -> bool {
    self.subscribers.is_empty()
      && self
        .idle_since
        .is_some_and(|idle| now - idle >= gc_time)
  }

  pub(super) fn view(&self, now: DateTime<Utc>, stale_time: Duration) -> QueryView<T> {
    QueryView {
      data: self.data.clone(),
      status: self.status,
      error: self.error.clone(),
      is_stale: self.data.is_some() && !self.is_fresh(now, stale_time),
      last_fetched_at: self.last_fetched_at,
    }
  }

  pub(super) fn attach(&mut self, id: SubscriberId, listener: Listener<T>) {
    self.idle_since = None;
    self.subscribers.push(Subscriber { id, listener });
  }

  /// Returns false if `id` was not subscribed.
  pub(super) fn detach(&mut self, id: SubscriberId, now: DateTime<Utc>) -> bool {
    let before = self.subscribers.len();
    self.subscribers.retain(|s| s.id != id);
    let removed = self.subscribers.len() != before;
    if removed && self.subscribers.is_empty() {
      self.idle_since = Some(now);
    }
    removed
  }

  /// Notify every subscriber, in registration order.
  pub(super) fn notify_all(&mut self, view: &QueryView<T>) {
    for subscriber in &mut self.subscribers {
      (subscriber.listener)(view);
    }
  }

  pub(super) fn notify_one(&mut self, id: SubscriberId, view: &QueryView<T>) {
    if let Some(subscriber) = self.subscribers.iter_mut().find(|s| s.id == id) {
      (subscriber.listener)(view);
    }
  }
}

impl<T> std::fmt::Debug for CacheEntry<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CacheEntry")
      .field("key", &self.key)
      .field("status", &self.status)
      .field("has_data", &self.data.is_some())
      .field("error", &self.error)
      .field("last_fetched_at", &self.last_fetched_at)
      .field("subscribers", &self.subscribers.len())
      .finish_non_exhaustive()
  }
}
