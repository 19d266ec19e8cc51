//! Domain types rendered by the screens.

use serde::Deserialize;

use super::api_types::{ApiPokemon, ApiSpecies};

/// Highest base stat any Pokémon has; stat bars are scaled against it.
pub const MAX_BASE_STAT: u32 = 255;

const ARTWORK_BASE: &str =
  "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/other/official-artwork";

/// A Pokémon as shown on the detail screen
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "ApiPokemon")]
pub struct Pokemon {
  pub id: u32,
  pub name: String,
  /// Type names ordered by slot; the first one drives the screen colour
  pub types: Vec<String>,
  /// Hectograms
  pub weight: u32,
  /// Decimetres
  pub height: u32,
  pub moves: Vec<String>,
  pub stats: Vec<Stat>,
  pub cry_url: Option<String>,
}

impl From<ApiPokemon> for Pokemon {
  fn from(api: ApiPokemon) -> Self {
    let mut types = api.types;
    types.sort_by_key(|t| t.slot);

    Self {
      id: api.id,
      name: api.name,
      types: types.into_iter().map(|t| t.kind.name).collect(),
      weight: api.weight,
      height: api.height,
      moves: api.moves.into_iter().map(|m| m.move_ref.name).collect(),
      stats: api
        .stats
        .into_iter()
        .map(|s| Stat {
          name: s.stat.name,
          value: s.base_stat,
        })
        .collect(),
      cry_url: api.cries.and_then(|c| c.latest.or(c.legacy)),
    }
  }
}

impl Pokemon {
  pub fn display_name(&self) -> String {
    capitalize(&self.name)
  }

  pub fn primary_type(&self) -> Option<&str> {
    self.types.first().map(String::as_str)
  }

  /// Weight as `6.9 kg`.
  pub fn formatted_weight(&self) -> String {
    format_tenths(self.weight, "kg")
  }

  /// Height as `0.7 m`.
  pub fn formatted_height(&self) -> String {
    format_tenths(self.height, "m")
  }

  /// The first two moves, capitalized.
  pub fn headline_moves(&self) -> Vec<String> {
    self.moves.iter().take(2).map(|m| capitalize(m)).collect()
  }
}

/// A base stat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stat {
  pub name: String,
  pub value: u32,
}

impl Stat {
  /// Placeholder stats shown before the real ones arrive.
  pub fn baseline() -> Vec<Stat> {
    [
      "hp",
      "attack",
      "defense",
      "special-attack",
      "special-defense",
      "speed",
    ]
    .into_iter()
    .map(|name| Stat {
      name: name.to_string(),
      value: 1,
    })
    .collect()
  }

  pub fn short_label(&self) -> &str {
    match self.name.as_str() {
      "hp" => "HP",
      "attack" => "ATK",
      "defense" => "DEF",
      "special-attack" => "SATK",
      "special-defense" => "SDEF",
      "speed" => "SPD",
      other => other,
    }
  }

  /// Share of [`MAX_BASE_STAT`], clamped to 1.0.
  pub fn ratio(&self) -> f64 {
    (f64::from(self.value) / f64::from(MAX_BASE_STAT)).min(1.0)
  }
}

/// Species data; only the flavor text is used
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "ApiSpecies")]
pub struct Species {
  /// English flavor text, flattened to one line
  pub bio: Option<String>,
}

impl From<ApiSpecies> for Species {
  fn from(api: ApiSpecies) -> Self {
    let bio = api
      .flavor_text_entries
      .into_iter()
      .find(|entry| entry.language.name == "en")
      .map(|entry| flatten_flavor_text(&entry.flavor_text));

    Self { bio }
  }
}

/// Official artwork for a dex number.
pub fn artwork_url(id: u32) -> String {
  format!("{}/{}.png", ARTWORK_BASE, id)
}

fn flatten_flavor_text(text: &str) -> String {
  text.replace('\u{c}', " ").replace('\n', ". ")
}

fn format_tenths(value: u32, unit: &str) -> String {
  format!("{}.{} {}", value / 10, value % 10, unit)
}

fn capitalize(s: &str) -> String {
  let mut chars = s.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const BULBASAUR: &str = r#"{
    "id": 1,
    "name": "bulbasaur",
    "weight": 69,
    "height": 7,
    "types": [
      { "slot": 2, "type": { "name": "poison", "url": "https://pokeapi.co/api/v2/type/4/" } },
      { "slot": 1, "type": { "name": "grass", "url": "https://pokeapi.co/api/v2/type/12/" } }
    ],
    "stats": [
      { "base_stat": 45, "effort": 0, "stat": { "name": "hp", "url": "" } },
      { "base_stat": 49, "effort": 0, "stat": { "name": "attack", "url": "" } }
    ],
    "moves": [
      { "move": { "name": "razor-wind", "url": "" } },
      { "move": { "name": "swords-dance", "url": "" } },
      { "move": { "name": "cut", "url": "" } }
    ],
    "cries": { "latest": "https://example.test/1.ogg", "legacy": null },
    "base_experience": 64
  }"#;

  #[test]
  fn test_pokemon_from_api_json() {
    let pokemon: Pokemon = serde_json::from_str(BULBASAUR).unwrap();
    assert_eq!(pokemon.id, 1);
    assert_eq!(pokemon.display_name(), "Bulbasaur");
    assert_eq!(pokemon.types, vec!["grass", "poison"]);
    assert_eq!(pokemon.primary_type(), Some("grass"));
    assert_eq!(pokemon.stats[0], Stat { name: "hp".to_string(), value: 45 });
    assert_eq!(pokemon.cry_url.as_deref(), Some("https://example.test/1.ogg"));
  }

  #[test]
  fn test_formatting() {
    let pokemon: Pokemon = serde_json::from_str(BULBASAUR).unwrap();
    assert_eq!(pokemon.formatted_weight(), "6.9 kg");
    assert_eq!(pokemon.formatted_height(), "0.7 m");
    assert_eq!(pokemon.headline_moves(), vec!["Razor-wind", "Swords-dance"]);
  }

  #[test]
  fn test_minimal_pokemon() {
    let pokemon: Pokemon = serde_json::from_str(r#"{"id": 132, "name": "ditto"}"#).unwrap();
    assert!(pokemon.types.is_empty());
    assert_eq!(pokemon.primary_type(), None);
    assert_eq!(pokemon.cry_url, None);
    assert_eq!(pokemon.formatted_weight(), "0.0 kg");
  }

  #[test]
  fn test_species_picks_english_bio() {
    let json = r#"{
      "id": 1,
      "name": "bulbasaur",
      "flavor_text_entries": [
        { "flavor_text": "Une graine", "language": { "name": "fr", "url": "" } },
        { "flavor_text": "A strange seed was\nplanted on its\u000cback at birth.", "language": { "name": "en", "url": "" } }
      ]
    }"#;
    let species: Species = serde_json::from_str(json).unwrap();
    assert_eq!(
      species.bio.as_deref(),
      Some("A strange seed was. planted on its back at birth.")
    );
  }

  #[test]
  fn test_species_without_english_text() {
    let species: Species =
      serde_json::from_str(r#"{"id": 1, "name": "x", "flavor_text_entries": []}"#).unwrap();
    assert_eq!(species.bio, None);
  }

  #[test]
  fn test_stat_helpers() {
    let baseline = Stat::baseline();
    assert_eq!(baseline.len(), 6);
    assert!(baseline.iter().all(|s| s.value == 1));
    assert_eq!(baseline[3].short_label(), "SATK");

    let maxed = Stat {
      name: "hp".to_string(),
      value: 300,
    };
    assert_eq!(maxed.ratio(), 1.0);
  }

  #[test]
  fn test_artwork_url() {
    assert!(artwork_url(25).ends_with("/official-artwork/25.png"));
  }
}
