use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::nav::Navigator;
use crate::pokeapi::cached_client::{CachedPokeApi, ScreenQueries};
use crate::ui::{self, DetailScreen};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

/// Main application state
pub struct App {
  /// Current screen parameter (the dex number) and prev/next moves
  nav: Navigator,

  /// Cached PokeAPI queries
  api: CachedPokeApi,

  /// Subscriptions of the screen on display
  screen: Option<ScreenQueries>,

  /// Event sender for query listeners
  event_tx: mpsc::UnboundedSender<Event>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: &Config, start_id: u32) -> Result<Self> {
    let api = CachedPokeApi::new(config)?;
    let (tx, _rx) = mpsc::unbounded_channel();

    Ok(Self {
      nav: Navigator::new(config.dex, start_id),
      api,
      screen: None,
      event_tx: tx,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.event_loop(&mut terminal).await;

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
    let mut events = EventHandler::new(Duration::from_millis(100));
    self.event_tx = events.sender();

    self.open_screen()?;

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, &self.detail_screen()))?;

      if let Some(event) = events.next().await {
        self.handle_event(event)?;
      }
    }

    Ok(())
  }

  /// Swap the subscriptions over to the current dex number.
  fn open_screen(&mut self) -> Result<()> {
    if let Some(old) = self.screen.take() {
      self.api.unwatch(old);
    }

    let tx = self.event_tx.clone();
    let screen = self.api.watch(self.nav.current(), move || {
      let _ = tx.send(Event::QueryUpdated);
    })?;
    info!(id = screen.id, "opened screen");
    self.screen = Some(screen);

    Ok(())
  }

  fn handle_event(&mut self, event: Event) -> Result<()> {
    match event {
      Event::Key(key) => self.handle_key(key)?,
      Event::Tick => {
        self.api.poll();
      }
      // Redraw happens on the next loop iteration
      Event::QueryUpdated => {}
    }
    Ok(())
  }

  fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
    match key.code {
      KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
      KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.should_quit = true;
      }

      KeyCode::Left | KeyCode::Char('h') => {
        if self.nav.go_previous() {
          self.open_screen()?;
        }
      }
      KeyCode::Right | KeyCode::Char('l') => {
        if self.nav.go_next() {
          self.open_screen()?;
        }
      }

      // Manual retry: mark stale, then re-subscribe
      KeyCode::Char('r') => {
        self.api.invalidate(self.nav.current())?;
        self.open_screen()?;
      }

      _ => {}
    }
    Ok(())
  }

  pub fn detail_screen(&self) -> DetailScreen<'_> {
    DetailScreen {
      nav: &self.nav,
      pokemon: self.screen.as_ref().and_then(|s| self.api.pokemon(s)),
      species: self.screen.as_ref().and_then(|s| self.api.species(s)),
    }
  }
}
