//! PokeAPI resources, HTTP access and the cached screen queries.

pub mod api_types;
pub mod cached_client;
pub mod client;
pub mod types;
