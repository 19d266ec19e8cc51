use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with logo, name, dex number and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, name: &str, label: &str, accent: Color) {
  let header = Line::from(vec![
    Span::styled(" pokedex ", Style::default().fg(accent).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", name), Style::default().fg(Color::White).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", label), Style::default().fg(Color::Yellow)),
    Span::raw("  "),
    // Shortcuts - keys and brackets highlighted, descriptions dimmed
    Span::styled("<←/h>", Style::default().fg(accent)),
    Span::styled(" prev", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<→/l>", Style::default().fg(accent)),
    Span::styled(" next", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<r>", Style::default().fg(accent)),
    Span::styled(" refresh", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<q>", Style::default().fg(accent)),
    Span::styled(" quit", Style::default().fg(Color::DarkGray)),
  ]);

  let paragraph = Paragraph::new(header).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}
