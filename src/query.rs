//! Query client: the consumer-facing side of the cache.
//!
//! Inspired by TanStack Query's `useQuery`, a view subscribes with a path
//! template and parameters, renders whatever [`QueryView`] currently holds,
//! and unsubscribes on teardown.
//!
//! # Example
//!
//! ```ignore
//! let mut pokemon: QueryClient<Pokemon> = QueryClient::new(api, QueryCache::new(options));
//!
//! let sub = pokemon.subscribe(
//!     "/pokemon/[id]",
//!     &Params::new().with("id", 1),
//!     Box::new(move |_| { let _ = tx.send(Event::QueryUpdated); }),
//! )?;
//!
//! // In event loop tick
//! pokemon.poll();
//!
//! // In render
//! match pokemon.view(&sub) {
//!     Some(view) if view.is_loading() => render_spinner(),
//!     Some(view) => render(view.data(), view.error()),
//!     None => {}
//! }
//! ```

use serde::de::DeserializeOwned;

use crate::cache::{Listener, QueryCache, QueryView, Subscription};
use crate::pokeapi::client::ApiClient;
use crate::request::{Params, RequestBuilder, RequestError};

/// Typed query client for one resource type.
pub struct QueryClient<T> {
  builder: RequestBuilder,
  cache: QueryCache<T>,
  api: ApiClient,
}

impl<T> QueryClient<T>
where
  T: DeserializeOwned + Send + Sync + 'static,
{
  pub fn new(api: ApiClient, cache: QueryCache<T>) -> Self {
    Self {
      builder: RequestBuilder::new(api.base_url().clone()),
      cache,
      api,
    }
  }

  /// Subscribe to the resource at `template` with `params`.
  ///
  /// Fails before any network call if the template can't be resolved.
  pub fn subscribe(
    &mut self,
    template: &str,
    params: &Params,
    listener: Listener<T>,
  ) -> Result<Subscription, RequestError> {
    let request = self.builder.resolve(template, params)?;
    let api = self.api.clone();
    let url = request.url;

    Ok(self.cache.subscribe(
      request.key,
      move || async move { api.get_json::<T>(url).await },
      listener,
    ))
  }

  pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
    self.cache.unsubscribe(subscription)
  }

  /// Invalidate the entry for `template` with `params`, if there is one.
  pub fn invalidate(&mut self, template: &str, params: &Params) -> Result<bool, RequestError> {
    let request = self.builder.resolve(template, params)?;
    Ok(self.cache.invalidate(&request.key))
  }

  pub fn view(&self, subscription: &Subscription) -> Option<QueryView<T>> {
    self.cache.view(subscription.key())
  }

  /// Apply settled fetches; returns how many entries changed.
  pub fn poll(&mut self) -> usize {
    self.cache.poll()
  }

  pub async fn settle_next(&mut self) -> bool {
    self.cache.settle_next().await
  }

  pub fn cache(&self) -> &QueryCache<T> {
    &self.cache
  }
}
