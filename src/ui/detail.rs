use crate::cache::QueryView;
use crate::pokeapi::types::{artwork_url, Pokemon, Species, Stat};
use crate::ui::theme::{self, GRAY_MEDIUM};
use crate::ui::DetailScreen;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

const BAR_WIDTH: usize = 30;

/// Render the detail screen for the current dex number
pub fn draw_detail(frame: &mut Frame, area: Rect, screen: &DetailScreen) {
  let pokemon = screen.pokemon.as_ref().and_then(QueryView::data);
  let accent = theme::accent(pokemon.and_then(Pokemon::primary_type));

  let title = match pokemon {
    Some(p) => format!(" {} {} ", p.display_name(), screen.nav.label()),
    None => format!(" {} ", screen.nav.label()),
  };

  let block = Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(accent));

  let inner = block.inner(area);
  frame.render_widget(block, area);

  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Prev / next
      Constraint::Length(1), // Types
      Constraint::Length(1), // Status
      Constraint::Length(1), // Separator
      Constraint::Length(3), // About
      Constraint::Min(2),    // Bio
      Constraint::Length(8), // Base stats
      Constraint::Length(2), // Media
    ])
    .split(inner);

  frame.render_widget(Paragraph::new(nav_line(screen)), chunks[0]);

  if let Some(p) = pokemon {
    frame.render_widget(Paragraph::new(types_line(p)), chunks[1]);
  }

  if let Some(status) = status_line(screen) {
    frame.render_widget(Paragraph::new(status), chunks[2]);
  }

  frame.render_widget(Paragraph::new(about_lines(pokemon, accent)), chunks[4]);

  let bio = screen
    .species
    .as_ref()
    .and_then(QueryView::data)
    .and_then(|s: &Species| s.bio.clone())
    .unwrap_or_default();
  frame.render_widget(
    Paragraph::new(bio)
      .style(Style::default().fg(Color::White))
      .wrap(Wrap { trim: true }),
    chunks[5],
  );

  frame.render_widget(Paragraph::new(stat_lines(pokemon, accent)), chunks[6]);

  frame.render_widget(
    Paragraph::new(media_lines(screen.nav.current(), pokemon)),
    chunks[7],
  );
}

/// Arrows to the neighbouring dex numbers, hidden at the ends of the range
fn nav_line(screen: &DetailScreen) -> Line<'static> {
  let nav = screen.nav;
  let dim = Style::default().fg(GRAY_MEDIUM);

  let prev = if nav.is_first() {
    String::new()
  } else {
    format!("‹ #{:03}", nav.previous())
  };
  let next = if nav.is_last() {
    String::new()
  } else {
    format!("#{:03} ›", nav.next())
  };

  Line::from(vec![
    Span::styled(prev, dim),
    Span::raw("   "),
    Span::styled(next, dim),
  ])
}

fn types_line(pokemon: &Pokemon) -> Line<'static> {
  let mut spans = Vec::new();
  for name in &pokemon.types {
    spans.push(Span::styled(
      format!(" {} ", name.to_uppercase()),
      Style::default()
        .fg(Color::Black)
        .bg(theme::type_color(name))
        .bold(),
    ));
    spans.push(Span::raw(" "));
  }
  Line::from(spans)
}

/// Loading and error state of the two queries, if any
fn status_line(screen: &DetailScreen) -> Option<Line<'static>> {
  let views = [
    screen.pokemon.as_ref().map(|v| (v.is_loading(), v.error(), v.data.is_some())),
    screen.species.as_ref().map(|v| (v.is_loading(), v.error(), v.data.is_some())),
  ];

  if screen.pokemon.is_none() || views.iter().flatten().any(|(loading, _, _)| *loading) {
    return Some(Line::from(Span::styled(
      "Loading...",
      Style::default().fg(Color::DarkGray),
    )));
  }

  let (error, has_data) = views
    .iter()
    .flatten()
    .find_map(|(_, error, has_data)| error.map(|e| (e, *has_data)))?;

  let text = if has_data {
    format!("Refresh failed: {}  (r to retry)", error)
  } else {
    format!("Error: {}  (r to retry)", error)
  };
  Some(Line::from(Span::styled(text, Style::default().fg(Color::Red))))
}

fn about_lines(pokemon: Option<&Pokemon>, accent: Color) -> Vec<Line<'static>> {
  let label = Style::default().fg(GRAY_MEDIUM);
  let (weight, size, moves) = match pokemon {
    Some(p) => (
      p.formatted_weight(),
      p.formatted_height(),
      p.headline_moves().join(", "),
    ),
    None => ("-".to_string(), "-".to_string(), "-".to_string()),
  };

  vec![
    Line::from(Span::styled("About", Style::default().fg(accent).bold())),
    Line::from(vec![
      Span::styled("Weight: ", label),
      Span::raw(weight),
      Span::raw("   "),
      Span::styled("Size: ", label),
      Span::raw(size),
    ]),
    Line::from(vec![Span::styled("Moves: ", label), Span::raw(moves)]),
  ]
}

fn stat_lines(pokemon: Option<&Pokemon>, accent: Color) -> Vec<Line<'static>> {
  let stats = match pokemon {
    Some(p) if !p.stats.is_empty() => p.stats.clone(),
    _ => Stat::baseline(),
  };

  let mut lines = vec![Line::from(Span::styled(
    "Base Stats",
    Style::default().fg(accent).bold(),
  ))];

  for stat in &stats {
    let filled = ((stat.ratio() * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    lines.push(Line::from(vec![
      Span::styled(
        format!("{:<5}", stat.short_label()),
        Style::default().fg(accent).bold(),
      ),
      Span::raw(format!("{:03} ", stat.value)),
      Span::styled("█".repeat(filled), Style::default().fg(accent)),
      Span::styled(
        "░".repeat(BAR_WIDTH - filled),
        Style::default().fg(theme::GRAY_LIGHT),
      ),
    ]));
  }

  lines
}

fn media_lines(id: u32, pokemon: Option<&Pokemon>) -> Vec<Line<'static>> {
  let label = Style::default().fg(GRAY_MEDIUM);
  let mut lines = vec![Line::from(vec![
    Span::styled("Artwork: ", label),
    Span::raw(artwork_url(id)),
  ])];

  if let Some(cry) = pokemon.and_then(|p| p.cry_url.clone()) {
    lines.push(Line::from(vec![Span::styled("Cry: ", label), Span::raw(cry)]));
  }

  lines
}
