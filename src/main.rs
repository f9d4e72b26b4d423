mod app;
mod catalog;
mod config;
mod constants;
mod display;
mod graphics;
mod history;
mod input;
mod notify;
mod player;
mod theme;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::App;
use constants::constants;
use display::CliDisplayMode;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Display mode for cover art: 'auto', 'direct' (truecolor half-blocks) or 'ascii'
  #[arg(short, long, default_value = "auto")]
  display_mode: CliDisplayMode,

  /// Path of the search history file (defaults to the platform data directory)
  #[arg(long)]
  history_file: Option<PathBuf>,
}

// --- Logging ---

/// Route tracing output to a log file: the TUI owns the terminal, so there is
/// no usable stderr while the app runs.
fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = config::data_dir().join("logs");
  if std::fs::create_dir_all(&log_dir).is_err() {
    return None;
  }
  let appender = tracing_appender::rolling::never(log_dir, "hitmo.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(writer)
    .with_ansi(false)
    .init();
  Some(guard)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let _log_guard = init_logging();

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, args).await;
  ratatui::restore();
  result
}

async fn run(terminal: &mut DefaultTerminal, args: Args) -> Result<()> {
  let display_mode = display::resolve_display_mode(args.display_mode);
  let history_path = args.history_file.unwrap_or_else(|| config::data_dir().join(&constants().history_file_name));
  let mut app = App::new(display_mode, history_path).context("Failed to initialize")?;
  info!(mode = ?display_mode, "session started");

  let tick_interval = Duration::from_millis(constants().tick_interval_ms);
  let mut last_tick = Instant::now();

  loop {
    app.check_pending();

    // Fixed-interval tick: detect mpv exit, poll transport state for the
    // progress display, expire stale errors. Scoped to this loop; nothing
    // outlives it.
    if last_tick.elapsed() >= tick_interval {
      app.player.poll_exit();
      app.player.refresh_status().await;
      app.expire_error();
      last_tick = Instant::now();
    }

    terminal.draw(|frame| ui::ui(frame, &mut app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(&mut app, key).await?;
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  app.player.stop().await?;
  Ok(())
}
