mod app;
mod constants;
mod favorites;
mod input;
mod mood;
mod paginator;
mod prefs;
mod query;
mod theme;
mod tmdb;
mod ui;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::App;
use constants::constants;
use favorites::FavoritesStore;
use mood::MoodLabel;
use prefs::{PreferencesStore, SystemSignals};
use tmdb::CatalogClient;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// TMDB API key (v3)
  #[arg(long, env = "TMDB_API_KEY", hide_env_values = true, required_unless_present = "completions")]
  api_key: Option<String>,

  /// TMDB API base URL
  #[arg(long, env = "TMDB_API_URL")]
  api_url: Option<String>,

  /// Start straight in a mood session: happy, sad, excited or relaxed
  #[arg(short, long)]
  mood: Option<MoodLabel>,

  /// Print shell completions and exit
  #[arg(long, value_name = "SHELL")]
  completions: Option<Shell>,
}

// --- Logging ---

/// Log to a daily rolling file; the terminal belongs to the UI.
/// Filter from `MOODFLIX_LOG`, then `RUST_LOG`, default `info`.
fn init_logging() -> Option<WorkerGuard> {
  let dir = prefs::log_dir()?;
  std::fs::create_dir_all(&dir).ok()?;
  let appender = tracing_appender::rolling::daily(&dir, &constants().log_file_prefix);
  let (writer, guard) = tracing_appender::non_blocking(appender);
  let filter = EnvFilter::try_from_env("MOODFLIX_LOG")
    .or_else(|_| EnvFilter::try_from_default_env())
    .unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).try_init().ok()?;
  Some(guard)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), "moodflix", &mut std::io::stdout());
    return Ok(());
  }

  let _log_guard = init_logging();
  info!(version = env!("CARGO_PKG_VERSION"), "moodflix starting");

  let api_key = args.api_key.clone().context("TMDB API key missing (set TMDB_API_KEY or pass --api-key)")?;
  let api_url = args.api_url.clone().unwrap_or_else(|| constants().api_base_url.clone());
  let catalog = CatalogClient::new(api_key, api_url);
  let favorites = FavoritesStore::load(prefs::favorites_path());
  let preferences = PreferencesStore::load(prefs::prefs_path(), SystemSignals::detect());
  let mut app = App::new(catalog, favorites, preferences);

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, &mut app, args.mood).await;
  ratatui::restore();
  info!("moodflix exiting");
  result
}

async fn run(terminal: &mut DefaultTerminal, app: &mut App, initial_mood: Option<MoodLabel>) -> Result<()> {
  if let Some(mood) = initial_mood {
    app.start_mood(mood);
  }

  loop {
    app.check_pending();
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, app)).context("Failed to draw frame")?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(app, key);
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  Ok(())
}
