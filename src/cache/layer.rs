//! Query cache that orchestrates fetching, de-duplication and notification.

use chrono::{DateTime, Duration, Utc};
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::entry::{CacheEntry, SubscriberId};
use super::traits::{Clock, FetchError, Listener, QueryStatus, QueryView, SystemClock};
use crate::request::CacheKey;

/// Freshness and eviction policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
  /// How long fetched data is served without refetching
  pub stale_time: Duration,
  /// How long an entry without subscribers is kept; `None` keeps it forever
  pub gc_time: Option<Duration>,
}

impl Default for CacheOptions {
  fn default() -> Self {
    Self {
      stale_time: Duration::minutes(5),
      gc_time: None,
    }
  }
}

/// Handle returned by [`QueryCache::subscribe`]; give it back to unsubscribe.
#[derive(Debug, PartialEq, Eq)]
pub struct Subscription {
  key: CacheKey,
  id: SubscriberId,
}

impl Subscription {
  pub fn key(&self) -> &CacheKey {
    &self.key
  }
}

struct InFlightRequest {
  key: CacheKey,
  request_id: u64,
  /// Entry generation when the fetch started
  generation: u64,
  started_at: DateTime<Utc>,
  handle: JoinHandle<()>,
}

struct Settled<T> {
  key: CacheKey,
  result: Result<T, FetchError>,
}

/// Cache of remote data keyed by [`CacheKey`].
///
/// The cache is owned by a single task. Fetches run on the tokio runtime and
/// report back over a channel; their results are applied only when the owner
/// calls [`poll`](Self::poll) or [`settle_next`](Self::settle_next), so all
/// bookkeeping and listener calls happen on the owning task.
pub struct QueryCache<T> {
  entries: HashMap<CacheKey, CacheEntry<T>>,
  in_flight: HashMap<CacheKey, InFlightRequest>,
  settled_tx: mpsc::UnboundedSender<Settled<T>>,
  settled_rx: mpsc::UnboundedReceiver<Settled<T>>,
  clock: Arc<dyn Clock>,
  options: CacheOptions,
  next_subscriber: u64,
  next_request: u64,
}

impl<T: Send + Sync + 'static> QueryCache<T> {
  pub fn new(options: CacheOptions) -> Self {
    let (settled_tx, settled_rx) = mpsc::unbounded_channel();
    Self {
      entries: HashMap::new(),
      in_flight: HashMap::new(),
      settled_tx,
      settled_rx,
      clock: Arc::new(SystemClock),
      options,
      next_subscriber: 0,
      next_request: 0,
    }
  }

  /// Replace the clock used for freshness and eviction.
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  /// Register interest in `key`.
  ///
  /// `listener` is called right away with the current view, then on every
  /// change. If the entry is missing, stale, invalidated or failed, and no
  /// fetch for the key is running, `fetcher` is started; otherwise it is
  /// dropped unused.
  pub fn subscribe<F, Fut>(
    &mut self,
    key: CacheKey,
    fetcher: F,
    listener: Listener<T>,
  ) -> Subscription
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
  {
    // A fetch that already finished must not look in flight
    self.apply_settled();

    let now = self.clock.now();
    let id = SubscriberId(self.next_subscriber);
    self.next_subscriber += 1;

    let in_flight = self.in_flight.contains_key(&key);
    let needs_fetch = {
      let entry = self
        .entries
        .entry(key.clone())
        .or_insert_with(|| CacheEntry::new(key.clone()));
      entry.attach(id, listener);
      !in_flight && !entry.is_fresh(now, self.options.stale_time)
    };

    if needs_fetch {
      self.start_fetch(&key, now, fetcher);
      self.notify_all(&key, now);
    } else {
      if in_flight {
        debug!(key = %key, "attaching to in-flight fetch");
      }
      let stale_time = self.options.stale_time;
      if let Some(entry) = self.entries.get_mut(&key) {
        let view = entry.view(now, stale_time);
        entry.notify_one(id, &view);
      }
    }

    Subscription { key, id }
  }

  /// Remove a listener. An in-flight fetch keeps running either way.
  pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
    let now = self.clock.now();
    match self.entries.get_mut(&subscription.key) {
      Some(entry) => entry.detach(subscription.id, now),
      None => false,
    }
  }

  /// Mark `key` stale so the next subscription refetches it.
  pub fn invalidate(&mut self, key: &CacheKey) -> bool {
    self.apply_settled();
    let now = self.clock.now();
    match self.entries.get_mut(key) {
      Some(entry) => {
        entry.generation += 1;
        debug!(key = %key, generation = entry.generation, "invalidated");
        let view = entry.view(now, self.options.stale_time);
        entry.notify_all(&view);
        true
      }
      None => false,
    }
  }

  pub fn view(&self, key: &CacheKey) -> Option<QueryView<T>> {
    let now = self.clock.now();
    self
      .entries
      .get(key)
      .map(|entry| entry.view(now, self.options.stale_time))
  }

  pub fn entry(&self, key: &CacheKey) -> Option<&CacheEntry<T>> {
    self.entries.get(key)
  }

  pub fn subscriber_count(&self, key: &CacheKey) -> usize {
    self
      .entries
      .get(key)
      .map(CacheEntry::subscriber_count)
      .unwrap_or(0)
  }

  pub fn is_in_flight(&self, key: &CacheKey) -> bool {
    self.in_flight.contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Apply every fetch that has settled, without waiting, then evict idle
  /// entries. Returns the number of entries that changed.
  pub fn poll(&mut self) -> usize {
    let changed = self.apply_settled();
    self.evict_idle();
    changed
  }

  /// Wait for the next fetch to settle and apply it.
  ///
  /// Returns false straight away when nothing is in flight.
  pub async fn settle_next(&mut self) -> bool {
    while !self.in_flight.is_empty() {
      match self.settled_rx.recv().await {
        Some(settled) => {
          if self.apply(settled) {
            return true;
          }
        }
        None => break,
      }
    }
    false
  }

  /// Drop entries that have had no subscribers for longer than `gc_time`.
  pub fn evict_idle(&mut self) -> usize {
    let Some(gc_time) = self.options.gc_time else {
      return 0;
    };
    let now = self.clock.now();
    let in_flight = &self.in_flight;
    let before = self.entries.len();
    self
      .entries
      .retain(|key, entry| in_flight.contains_key(key) || !entry.is_evictable(now, gc_time));

    let evicted = before - self.entries.len();
    if evicted > 0 {
      debug!(evicted, "evicted idle cache entries");
    }
    evicted
  }

  fn apply_settled(&mut self) -> usize {
    let mut changed = 0;
    while let Ok(settled) = self.settled_rx.try_recv() {
      if self.apply(settled) {
        changed += 1;
      }
    }
    changed
  }

  fn start_fetch<F, Fut>(&mut self, key: &CacheKey, now: DateTime<Utc>, fetcher: F)
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
  {
    let Some(entry) = self.entries.get_mut(key) else {
      return;
    };
    entry.status = QueryStatus::Loading;
    let generation = entry.generation;

    let request_id = self.next_request;
    self.next_request += 1;
    debug!(key = %key, request_id, "starting fetch");

    let future = fetcher();
    let tx = self.settled_tx.clone();
    let task_key = key.clone();
    let handle = tokio::spawn(async move {
      let result = match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Aborted("fetch task panicked".to_string())),
      };
      // Send fails only once the cache is gone.
      let _ = tx.send(Settled {
        key: task_key,
        result,
      });
    });

    self.in_flight.insert(
      key.clone(),
      InFlightRequest {
        key: key.clone(),
        request_id,
        generation,
        started_at: now,
        handle,
      },
    );
  }

  fn apply(&mut self, settled: Settled<T>) -> bool {
    let Settled { key, result } = settled;
    let Some(request) = self.in_flight.remove(&key) else {
      return false;
    };

    let now = self.clock.now();
    let elapsed_ms = (now - request.started_at).num_milliseconds();
    let stale_time = self.options.stale_time;
    let Some(entry) = self.entries.get_mut(&key) else {
      return false;
    };

    match result {
      Ok(data) => {
        debug!(key = %request.key, request_id = request.request_id, elapsed_ms, "fetch succeeded");
        entry.data = Some(Arc::new(data));
        entry.status = QueryStatus::Success;
        entry.error = None;
        entry.last_fetched_at = Some(now);
        entry.fetched_generation = request.generation;
      }
      Err(error) => {
        warn!(key = %request.key, request_id = request.request_id, elapsed_ms, error = %error, "fetch failed");
        entry.status = QueryStatus::Error;
        entry.error = Some(error);
      }
    }

    let view = entry.view(now, stale_time);
    entry.notify_all(&view);
    true
  }

  fn notify_all(&mut self, key: &CacheKey, now: DateTime<Utc>) {
    let stale_time = self.options.stale_time;
    if let Some(entry) = self.entries.get_mut(key) {
      let view = entry.view(now, stale_time);
      entry.notify_all(&view);
    }
  }
}

impl<T> Drop for QueryCache<T> {
  fn drop(&mut self) {
    for (_, request) in self.in_flight.drain() {
      request.handle.abort();
    }
  }
}
