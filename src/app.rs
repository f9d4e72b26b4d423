use anyhow::{Context, Result};
use image::DynamicImage;
use ratatui::widgets::ListState;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::catalog::{self, SearchOutcome};
use crate::config::Config;
use crate::constants::constants;
use crate::display::DisplayMode;
use crate::history::SearchHistory;
use crate::notify;
use crate::player::Player;
use crate::theme::{THEMES, Theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  Input,
  History,
  Results,
}

/// In-flight async task receivers. Results are delivered through oneshot
/// channels and drained by `check_pending` on the event loop.
#[derive(Default)]
pub(crate) struct AsyncTasks {
  pub(crate) search_rx: Option<oneshot::Receiver<SearchOutcome>>,
  /// Cover fetches are keyed by the track's download URL so a slow response
  /// for a previous track is never applied to the current one.
  pub(crate) cover_rx: Option<oneshot::Receiver<(String, Result<DynamicImage>)>>,
}

pub struct App {
  pub input: String,
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub mode: AppMode,
  pub theme_index: usize,
  pub display_mode: DisplayMode,
  pub search_results: Vec<catalog::Track>,
  pub results_state: ListState,
  pub history: SearchHistory,
  pub history_state: ListState,
  pub player: Player,
  pub last_error: Option<String>,
  pub status_message: Option<String>,
  /// Set when the last search finished with zero usable tracks (whether the
  /// catalog had no matches or the fetch failed — the log tells them apart).
  pub no_results: bool,
  pub should_quit: bool,
  pub(crate) tasks: AsyncTasks,
  /// When the last error was set — used for auto-dismiss after 5 seconds.
  error_time: Option<Instant>,
}

impl App {
  pub fn new(display_mode: DisplayMode, history_path: PathBuf) -> Result<Self> {
    let config = Config::load();
    let theme_index =
      config.theme_name.as_ref().and_then(|name| THEMES.iter().position(|t| t.name == name)).unwrap_or(0);
    let volume = config.volume.unwrap_or(constants().default_volume).min(100);

    Ok(Self {
      input: String::new(),
      cursor_position: 0,
      input_scroll: 0,
      mode: AppMode::Input,
      theme_index,
      display_mode,
      search_results: Vec::new(),
      results_state: ListState::default(),
      history: SearchHistory::load(history_path),
      history_state: ListState::default(),
      player: Player::new(volume)?,
      last_error: None,
      status_message: None,
      no_results: false,
      should_quit: false,
      tasks: AsyncTasks::default(),
      error_time: None,
    })
  }

  pub fn theme(&self) -> &'static Theme {
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.save_config();
  }

  fn save_config(&self) {
    let config = Config { theme_name: Some(self.theme().name.to_string()), volume: Some(self.player.volume()) };
    config.save();
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  /// Clear the current error message and its expiry timer.
  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages after 5 seconds.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(5)
    {
      self.last_error = None;
      self.error_time = None;
    }
  }

  /// Drain finished background tasks and fold their results into the state.
  pub fn check_pending(&mut self) {
    if let Some(mut rx) = self.tasks.search_rx.take() {
      match rx.try_recv() {
        Ok(outcome) => {
          self.status_message = None;
          match outcome {
            SearchOutcome::Found(tracks) => {
              info!(count = tracks.len(), "search finished");
              self.search_results = tracks;
              self.results_state.select(Some(0));
              self.mode = AppMode::Results;
              self.no_results = false;
            }
            SearchOutcome::Empty => {
              self.no_results = true;
            }
            SearchOutcome::FetchFailed(e) => {
              // Degrades to the same no-results surface as a genuine empty
              // match; the reason only goes to the log.
              warn!(err = ?e, "search fetch failed");
              self.no_results = true;
            }
          }
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.search_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.status_message = None;
          self.set_error("Search task failed.".to_string());
        }
      }
    }

    if let Some(mut rx) = self.tasks.cover_rx.take() {
      match rx.try_recv() {
        Ok((key, result)) => match result {
          Ok(image) => {
            let still_current = self.player.current_track.as_ref().is_some_and(|t| t.download_url == key);
            if still_current {
              self.player.cover = Some(image);
            }
          }
          Err(e) => {
            warn!(err = ?e, "cover fetch failed");
          }
        },
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.cover_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {}
      }
    }
  }

  /// Submit the current input as a search. Blank input is a complete no-op:
  /// no fetch, no history mutation, no UI change.
  pub fn trigger_search(&mut self) -> Result<()> {
    let query = self.input.trim().to_string();
    if query.is_empty() {
      return Ok(());
    }
    info!(query = %query, "search submitted");

    self.history.record(&query)?;
    self.history_state.select(None);

    self.tasks.search_rx = None;
    self.clear_error();
    self.no_results = false;
    self.search_results.clear();
    self.results_state.select(None);
    self.status_message = Some(format!("Searching '{}'…", query));

    let client = self.player.http_client.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(catalog::search(&client, &query).await);
    });
    self.tasks.search_rx = Some(rx);
    Ok(())
  }

  /// Re-run a past query selected from the history pane.
  pub fn search_from_history(&mut self) -> Result<()> {
    let Some(selected) = self.history_state.selected() else { return Ok(()) };
    let Some(entry) = self.history.entries().get(selected) else { return Ok(()) };
    self.input = entry.clone();
    self.cursor_position = self.input.chars().count();
    self.input_scroll = 0;
    self.trigger_search()
  }

  /// Play the selected result. An out-of-range selection is a silent no-op.
  pub async fn trigger_play(&mut self) {
    let Some(index) = self.results_state.selected() else { return };
    let Some(track) = self.search_results.get(index).cloned() else { return };

    self.clear_error();
    self.tasks.cover_rx = None;
    if let Err(e) = self.player.play(track.clone()).await {
      self.set_error(format!("Playback error: {}", e));
      let _ = self.player.stop().await;
      return;
    }

    notify::now_playing(&format!("{} — {}", track.artist, track.title));

    if let Some(cover_url) = track.cover_url {
      let client = self.player.http_client.clone();
      let key = track.download_url;
      let (tx, rx) = oneshot::channel();
      tokio::spawn(async move {
        let _ = tx.send((key, catalog::fetch_cover(&client, &cover_url).await));
      });
      self.tasks.cover_rx = Some(rx);
    }
  }

  pub async fn stop_playback(&mut self) -> Result<()> {
    if self.player.is_playing() {
      self.player.stop().await.context("Failed to stop playback")?;
    }
    Ok(())
  }

  // --- Transport controls (pure delegation to the player) ---

  pub async fn toggle_pause(&mut self) {
    if self.player.is_playing()
      && let Err(e) = self.player.toggle_pause().await
    {
      warn!(err = ?e, "pause toggle failed");
    }
  }

  /// Jump to a slider position on the 0..=1000 scale.
  pub async fn seek_to_permille(&mut self, permille: u16) {
    let status = self.player.status;
    if !self.player.is_playing() || status.duration.is_zero() {
      return;
    }
    let target = seek_target(status.duration, permille);
    if let Err(e) = self.player.seek(target).await {
      warn!(err = ?e, "seek failed");
    }
  }

  /// Scrub relative to the current position, clamped into `[0, duration]`.
  pub async fn seek_by(&mut self, delta_secs: i64) {
    let status = self.player.status;
    if !self.player.is_playing() || status.duration.is_zero() {
      return;
    }
    let target = offset_target(status.position, status.duration, delta_secs);
    if let Err(e) = self.player.seek(target).await {
      warn!(err = ?e, "seek failed");
    }
  }

  pub async fn adjust_volume(&mut self, delta: i16) {
    let next = (self.player.volume() as i16 + delta).clamp(0, 100) as u8;
    self.player.set_volume(next).await;
    self.save_config();
  }
}

// --- Seek arithmetic ---

/// Map a slider position on the discretized seek scale to an absolute target,
/// clamped into `[0, duration]`.
pub(crate) fn seek_target(duration: Duration, permille: u16) -> Duration {
  let scale = constants().seek_slider_scale;
  duration.mul_f64(permille.min(scale) as f64 / scale as f64)
}

pub(crate) fn offset_target(position: Duration, duration: Duration, delta_secs: i64) -> Duration {
  let target = position.as_secs_f64() + delta_secs as f64;
  Duration::from_secs_f64(target.clamp(0.0, duration.as_secs_f64()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::Track;
  use anyhow::anyhow;

  fn test_app(dir: &tempfile::TempDir) -> App {
    App::new(DisplayMode::Ascii, dir.path().join("search_history.json")).unwrap()
  }

  fn track(title: &str) -> Track {
    Track {
      title: title.to_string(),
      artist: "Artist".to_string(),
      download_url: format!("https://example.com/get/{}", title),
      cover_url: None,
    }
  }

  // --- Search submission ---

  #[test]
  fn blank_submit_is_a_complete_noop() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = test_app(&dir);
    app.input = "   \t ".to_string();

    app.trigger_search().unwrap();

    assert!(app.tasks.search_rx.is_none(), "no fetch must be spawned");
    assert!(app.history.is_empty(), "history must not be touched");
    assert!(app.search_results.is_empty());
    assert!(app.status_message.is_none());
    assert_eq!(app.mode, AppMode::Input);
  }

  #[tokio::test]
  async fn submit_records_history_and_spawns_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = test_app(&dir);
    app.input = "  daft   punk ".to_string();

    app.trigger_search().unwrap();

    assert_eq!(app.history.entries(), ["daft punk"]);
    assert!(app.tasks.search_rx.is_some());
    assert!(app.status_message.is_some());
  }

  // --- Outcome handling ---

  #[tokio::test]
  async fn found_outcome_populates_results() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = test_app(&dir);

    let (tx, rx) = oneshot::channel();
    tx.send(SearchOutcome::Found(vec![track("a"), track("b")])).unwrap();
    app.tasks.search_rx = Some(rx);
    app.check_pending();

    assert_eq!(app.search_results.len(), 2);
    assert_eq!(app.results_state.selected(), Some(0));
    assert_eq!(app.mode, AppMode::Results);
    assert!(!app.no_results);
  }

  #[tokio::test]
  async fn empty_outcome_sets_no_results_indicator() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = test_app(&dir);

    let (tx, rx) = oneshot::channel();
    tx.send(SearchOutcome::Empty).unwrap();
    app.tasks.search_rx = Some(rx);
    app.check_pending();

    assert!(app.search_results.is_empty());
    assert!(app.no_results);
  }

  #[tokio::test]
  async fn fetch_failure_degrades_to_no_results_without_error_surface() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = test_app(&dir);

    let (tx, rx) = oneshot::channel();
    tx.send(SearchOutcome::FetchFailed(anyhow!("connection refused"))).unwrap();
    app.tasks.search_rx = Some(rx);
    app.check_pending();

    assert!(app.search_results.is_empty());
    assert!(app.no_results, "failed fetch must show the no-results indicator");
    assert!(app.last_error.is_none(), "network failure is not a UI error state");
  }

  // --- Track selection ---

  #[tokio::test]
  async fn out_of_range_selection_is_silent_noop() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = test_app(&dir);
    app.search_results = vec![track("only")];
    app.results_state.select(Some(7));

    app.trigger_play().await;

    assert!(!app.player.is_playing());
    assert!(app.last_error.is_none());
  }

  #[tokio::test]
  async fn no_selection_is_silent_noop() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = test_app(&dir);
    app.search_results = vec![track("only")];
    app.results_state.select(None);

    app.trigger_play().await;

    assert!(!app.player.is_playing());
  }

  // --- Seek arithmetic ---

  #[test]
  fn seek_target_maps_the_slider_scale() {
    let duration = Duration::from_secs(200);
    assert_eq!(seek_target(duration, 0), Duration::ZERO);
    assert_eq!(seek_target(duration, 500), Duration::from_secs(100));
    assert_eq!(seek_target(duration, 1000), duration);
  }

  #[test]
  fn seek_target_clamps_overrange_slider_values() {
    let duration = Duration::from_secs(200);
    assert_eq!(seek_target(duration, 5000), duration);
  }

  #[test]
  fn offset_target_clamps_into_track_bounds() {
    let duration = Duration::from_secs(100);
    assert_eq!(offset_target(Duration::from_secs(2), duration, -5), Duration::ZERO);
    assert_eq!(offset_target(Duration::from_secs(98), duration, 5), duration);
    assert_eq!(offset_target(Duration::from_secs(50), duration, 5), Duration::from_secs(55));
  }
}
