//! PokeAPI access through the query cache.

use color_eyre::Result;

use crate::cache::{CacheOptions, QueryCache, QueryView, Subscription};
use crate::config::Config;
use crate::query::QueryClient;
use crate::request::{Params, RequestError};

use super::client::ApiClient;
use super::types::{Pokemon, Species};

pub const POKEMON_PATH: &str = "/pokemon/[id]";
pub const SPECIES_PATH: &str = "/pokemon-species/[id]";

/// Subscriptions held by the detail screen for one dex number.
#[derive(Debug)]
pub struct ScreenQueries {
  pub id: u32,
  pokemon: Subscription,
  species: Subscription,
}

/// Cached access to the resources the detail screen needs.
pub struct CachedPokeApi {
  pokemon: QueryClient<Pokemon>,
  species: QueryClient<Species>,
}

impl CachedPokeApi {
  pub fn new(config: &Config) -> Result<Self> {
    let api = ApiClient::new(config)?;
    Ok(Self::with_client(api, CacheOptions::from(&config.cache)))
  }

  pub fn with_client(api: ApiClient, options: CacheOptions) -> Self {
    Self {
      pokemon: QueryClient::new(api.clone(), QueryCache::new(options)),
      species: QueryClient::new(api, QueryCache::new(options)),
    }
  }

  /// Subscribe to both resources for `id`. `notify` runs on every change.
  pub fn watch<N>(&mut self, id: u32, notify: N) -> Result<ScreenQueries, RequestError>
  where
    N: Fn() + Clone + Send + 'static,
  {
    let params = Params::new().with("id", id);

    let on_pokemon = notify.clone();
    let pokemon = self.pokemon.subscribe(
      POKEMON_PATH,
      &params,
      Box::new(move |_: &QueryView<Pokemon>| on_pokemon()),
    )?;

    let species = self.species.subscribe(
      SPECIES_PATH,
      &params,
      Box::new(move |_: &QueryView<Species>| notify()),
    )?;

    Ok(ScreenQueries {
      id,
      pokemon,
      species,
    })
  }

  pub fn unwatch(&mut self, screen: ScreenQueries) {
    self.pokemon.unsubscribe(screen.pokemon);
    self.species.unsubscribe(screen.species);
  }

  /// Mark both resources for `id` stale.
  pub fn invalidate(&mut self, id: u32) -> Result<(), RequestError> {
    let params = Params::new().with("id", id);
    self.pokemon.invalidate(POKEMON_PATH, &params)?;
    self.species.invalidate(SPECIES_PATH, &params)?;
    Ok(())
  }

  pub fn pokemon(&self, screen: &ScreenQueries) -> Option<QueryView<Pokemon>> {
    self.pokemon.view(&screen.pokemon)
  }

  pub fn species(&self, screen: &ScreenQueries) -> Option<QueryView<Species>> {
    self.species.view(&screen.species)
  }

  /// Apply settled fetches; returns how many entries changed.
  pub fn poll(&mut self) -> usize {
    self.pokemon.poll() + self.species.poll()
  }
}
