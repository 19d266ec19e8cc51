mod app;
mod cache;
mod config;
mod event;
mod logging;
mod nav;
mod pokeapi;
mod query;
mod request;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pokedex")]
#[command(about = "A terminal Pokédex backed by PokeAPI")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/pokedex/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Dex number to open first
  #[arg(short, long)]
  id: Option<String>,

  /// PokeAPI base URL
  #[arg(long)]
  api_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Override API url if specified on command line
  if let Some(api_url) = args.api_url {
    config.api.base_url = api_url;
  }
  config.validate()?;

  let start_id = match args.id.as_deref() {
    Some(param) => nav::Navigator::parse_id(param)?,
    None => config.dex.first,
  };

  let _log_guard = logging::init(&config)?;
  info!(start_id, base_url = %config.api.base_url, "starting");

  // Initialize and run the app
  let mut app = app::App::new(&config, start_id)?;
  app.run().await?;

  Ok(())
}
