//! File logging. The terminal belongs to the UI, so everything goes to
//! `pokedex.log` in the data directory.

use color_eyre::{eyre::eyre, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

pub const LOG_ENV: &str = "POKEDEX_LOG";
pub const LOG_FILE: &str = "pokedex.log";

/// Initialize the tracing subscriber.
///
/// Filtering comes from `POKEDEX_LOG` (defaults to `info`). The returned
/// guard flushes the writer when dropped, so keep it alive until exit.
pub fn init(config: &Config) -> Result<WorkerGuard> {
  let dir = config.log_dir()?;
  init_in(&dir)
}

fn init_in(dir: &Path) -> Result<WorkerGuard> {
  std::fs::create_dir_all(dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let appender = tracing_appender::rolling::never(dir, LOG_FILE);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let env_filter =
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::registry()
    .with(env_filter)
    .with(
      fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true),
    )
    .try_init()
    .map_err(|e| eyre!("Failed to initialize tracing: {}", e))?;

  Ok(guard)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_init_creates_log_file() {
    let dir = std::env::temp_dir().join(format!("pokedex-log-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);

    // Only one subscriber per process; a second init must fail cleanly
    let first = init_in(&dir);
    assert!(init_in(&dir).is_err());

    tracing::info!("log line");
    drop(first);
    assert!(dir.join(LOG_FILE).exists());

    let _ = std::fs::remove_dir_all(&dir);
  }
}
