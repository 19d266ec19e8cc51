//! Serde-deserializable types matching PokeAPI responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on what the screens render.

use serde::Deserialize;

// ============================================================================
// Common nested types
// ============================================================================

/// `{ "name": ..., "url": ... }` reference to another resource. Only the
/// name is kept.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiNamedResource {
  pub name: String,
}

// ============================================================================
// /pokemon/{id}
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ApiPokemon {
  pub id: u32,
  pub name: String,
  /// Hectograms
  #[serde(default)]
  pub weight: u32,
  /// Decimetres
  #[serde(default)]
  pub height: u32,
  #[serde(default)]
  pub types: Vec<ApiTypeSlot>,
  #[serde(default)]
  pub stats: Vec<ApiStat>,
  #[serde(default)]
  pub moves: Vec<ApiMoveSlot>,
  pub cries: Option<ApiCries>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTypeSlot {
  pub slot: u8,
  #[serde(rename = "type")]
  pub kind: ApiNamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiStat {
  pub base_stat: u32,
  pub stat: ApiNamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiMoveSlot {
  #[serde(rename = "move")]
  pub move_ref: ApiNamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCries {
  pub latest: Option<String>,
  pub legacy: Option<String>,
}

// ============================================================================
// /pokemon-species/{id}
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSpecies {
  #[serde(default)]
  pub flavor_text_entries: Vec<ApiFlavorText>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiFlavorText {
  pub flavor_text: String,
  pub language: ApiNamedResource,
}
