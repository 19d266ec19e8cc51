mod detail;
mod header;
pub mod theme;

use crate::cache::QueryView;
use crate::nav::Navigator;
use crate::pokeapi::types::{Pokemon, Species};
use ratatui::prelude::*;

/// Everything the detail screen renders, borrowed from the app
pub struct DetailScreen<'a> {
  pub nav: &'a Navigator,
  pub pokemon: Option<QueryView<Pokemon>>,
  pub species: Option<QueryView<Species>>,
}

/// Main draw function
pub fn draw(frame: &mut Frame, screen: &DetailScreen) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
    ])
    .split(frame.area());

  let pokemon = screen.pokemon.as_ref().and_then(QueryView::data);
  let accent = theme::accent(pokemon.and_then(Pokemon::primary_type));
  let name = pokemon.map(Pokemon::display_name).unwrap_or_default();

  header::draw_header(frame, chunks[0], &name, &screen.nav.label(), accent);
  detail::draw_detail(frame, chunks[1], screen);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{FetchError, QueryStatus};
  use crate::nav::DexRange;
  use ratatui::backend::TestBackend;
  use ratatui::Terminal;
  use std::sync::Arc;

  fn render(screen: &DetailScreen) -> (String, Terminal<TestBackend>) {
    let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
    terminal.draw(|frame| draw(frame, screen)).unwrap();

    let buffer = terminal.backend().buffer().clone();
    let text = buffer
      .content()
      .chunks(buffer.area.width as usize)
      .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
      .collect::<Vec<_>>()
      .join("\n");
    (text, terminal)
  }

  fn view<T>(status: QueryStatus, data: Option<T>, error: Option<FetchError>) -> QueryView<T> {
    QueryView {
      data: data.map(Arc::new),
      status,
      error,
      is_stale: false,
      last_fetched_at: None,
    }
  }

  fn bulbasaur() -> Pokemon {
    serde_json::from_value(serde_json::json!({
      "id": 1,
      "name": "bulbasaur",
      "weight": 69,
      "height": 7,
      "types": [{ "slot": 1, "type": { "name": "grass" } }],
      "stats": [{ "base_stat": 45, "stat": { "name": "hp" } }],
      "moves": [{ "move": { "name": "razor-wind" } }, { "move": { "name": "cut" } }]
    }))
    .unwrap()
  }

  #[test]
  fn test_loading_screen_uses_tint_and_baseline_stats() {
    let nav = Navigator::new(DexRange::default(), 1);
    let screen = DetailScreen {
      nav: &nav,
      pokemon: Some(view(QueryStatus::Loading, None, None)),
      species: Some(view(QueryStatus::Loading, None, None)),
    };

    let (text, terminal) = render(&screen);
    assert!(text.contains("Loading..."));
    assert!(text.contains("#001"));
    assert!(text.contains("SATK 001"));
    assert!(!text.contains("‹"));
    assert!(text.contains("#002 ›"));

    // Top-left border corner of the detail block carries the accent
    let corner = &terminal.backend().buffer()[(0, 1)];
    assert_eq!(corner.fg, theme::TINT);
  }

  #[test]
  fn test_loaded_screen_shows_details() {
    let nav = Navigator::new(DexRange::default(), 1);
    let species = Species {
      bio: Some("A strange seed was planted on its back at birth.".to_string()),
    };
    let screen = DetailScreen {
      nav: &nav,
      pokemon: Some(view(QueryStatus::Success, Some(bulbasaur()), None)),
      species: Some(view(QueryStatus::Success, Some(species), None)),
    };

    let (text, terminal) = render(&screen);
    assert!(text.contains("Bulbasaur #001"));
    assert!(text.contains("GRASS"));
    assert!(text.contains("6.9 kg"));
    assert!(text.contains("0.7 m"));
    assert!(text.contains("Razor-wind, Cut"));
    assert!(text.contains("A strange seed"));
    assert!(text.contains("HP   045"));
    assert!(text.contains("official-artwork/1.png"));
    assert!(!text.contains("Loading..."));

    let corner = &terminal.backend().buffer()[(0, 1)];
    assert_eq!(corner.fg, theme::type_color("grass"));
  }

  #[test]
  fn test_error_keeps_stale_data_visible() {
    let nav = Navigator::new(DexRange::default(), 151);
    let error = FetchError::Status {
      status: 503,
      url: "http://pokeapi.test/pokemon/151".to_string(),
    };
    let screen = DetailScreen {
      nav: &nav,
      pokemon: Some(view(QueryStatus::Error, Some(bulbasaur()), Some(error))),
      species: Some(view(QueryStatus::Success, None, None)),
    };

    let (text, _) = render(&screen);
    assert!(text.contains("Refresh failed"));
    assert!(text.contains("Bulbasaur"));
    assert!(text.contains("‹ #150"));
    assert!(!text.contains("›"));
  }

  #[test]
  fn test_error_without_data() {
    let nav = Navigator::new(DexRange::default(), 7);
    let screen = DetailScreen {
      nav: &nav,
      pokemon: Some(view(
        QueryStatus::Error,
        None,
        Some(FetchError::Transport("connection refused".to_string())),
      )),
      species: None,
    };

    let (text, _) = render(&screen);
    assert!(text.contains("Error: transport error: connection refused"));
    assert!(text.contains("r to retry"));
  }
}
