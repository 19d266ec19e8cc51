//! In-memory query cache for remote data.
//!
//! This module is independent of any particular API. It:
//! - Stores one entry per [`CacheKey`](crate::request::CacheKey)
//! - Shares a single fetch between concurrent subscribers of the same key
//! - Serves fresh data without fetching, refetches stale or invalidated data
//! - Keeps the last good value when a refetch fails
//! - Evicts entries that have had no subscribers for a configured time

mod entry;
mod layer;
mod traits;

pub use layer::{CacheOptions, QueryCache, Subscription};
pub use traits::{FetchError, Listener, QueryStatus, QueryView};
