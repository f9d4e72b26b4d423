//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available —
//! no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // Catalog endpoint
  pub catalog_base_url: String,
  pub search_path: String,
  pub search_query_param: String,
  pub user_agent: String,
  pub request_timeout_secs: u64,

  // Search history
  pub history_limit: usize,
  pub history_file_name: String,

  // Playback
  pub tick_interval_ms: u64,
  pub seek_slider_scale: u16,
  pub seek_step_secs: i64,
  pub volume_step: u8,
  pub default_volume: u8,

  // mpv IPC
  pub ipc_response_timeout_ms: u64,
  pub ipc_max_response_lines: usize,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is a build-time error.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
