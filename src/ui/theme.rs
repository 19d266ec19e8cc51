use ratatui::prelude::Color;

/// Accent used before a Pokémon's type is known
pub const TINT: Color = Color::Rgb(0xDC, 0x0A, 0x2D);
pub const GRAY_MEDIUM: Color = Color::Rgb(0x66, 0x66, 0x66);
pub const GRAY_LIGHT: Color = Color::Rgb(0xE0, 0xE0, 0xE0);

/// Display colour for a Pokémon type
pub fn type_color(name: &str) -> Color {
  match name {
    "normal" => Color::Rgb(0xAA, 0xA6, 0x7F),
    "fighting" => Color::Rgb(0xC1, 0x22, 0x39),
    "flying" => Color::Rgb(0xA8, 0x91, 0xEC),
    "ground" => Color::Rgb(0xDE, 0xC1, 0x6B),
    "poison" => Color::Rgb(0xA4, 0x3E, 0x9E),
    "rock" => Color::Rgb(0xB6, 0x9E, 0x31),
    "bug" => Color::Rgb(0xA7, 0xB7, 0x23),
    "ghost" => Color::Rgb(0x70, 0x55, 0x9B),
    "steel" => Color::Rgb(0xB7, 0xB9, 0xD0),
    "fire" => Color::Rgb(0xF5, 0x7D, 0x31),
    "water" => Color::Rgb(0x64, 0x93, 0xEB),
    "grass" => Color::Rgb(0x74, 0xCB, 0x48),
    "electric" => Color::Rgb(0xF9, 0xCF, 0x30),
    "psychic" => Color::Rgb(0xFB, 0x55, 0x84),
    "ice" => Color::Rgb(0x9A, 0xD6, 0xDF),
    "dragon" => Color::Rgb(0x70, 0x37, 0xFF),
    "dark" => Color::Rgb(0x75, 0x57, 0x4C),
    "fairy" => Color::Rgb(0xE6, 0x9E, 0xAC),
    _ => TINT,
  }
}

/// Screen accent: the primary type's colour, or the tint
pub fn accent(primary_type: Option<&str>) -> Color {
  primary_type.map(type_color).unwrap_or(TINT)
}
