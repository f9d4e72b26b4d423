//! Playback collaborator: one `mpv` child process per track, controlled over
//! mpv's JSON IPC socket.
//!
//! The `Player` is created once at session start, owned by the `App`, and
//! released on shutdown. It never decodes audio itself; it only hands mpv a
//! media URL and speaks the IPC protocol for transport control.

use anyhow::{Context, Result, anyhow};
use image::DynamicImage;
use reqwest::Client;
use serde_json::{Value, json};
use std::process::Stdio;
use std::time::Duration;
use tokio::{
  io::{AsyncBufReadExt, AsyncWriteExt, BufReader as TokioBufReader},
  net::UnixStream,
  process::{Child as TokioChild, Command},
};
use tracing::{debug, info};

use crate::catalog::Track;
use crate::constants::constants;

/// Snapshot of mpv's transport state, refreshed by the periodic tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaybackStatus {
  pub position: Duration,
  pub duration: Duration,
  pub paused: bool,
}

pub struct Player {
  pub http_client: Client,
  current_process: Option<TokioChild>,
  ipc_socket_path: Option<String>,
  /// Track currently loaded into the player, if any.
  pub current_track: Option<Track>,
  /// Cover image for the current track, fetched best-effort after selection.
  pub cover: Option<DynamicImage>,
  /// Last successfully polled status; a failed poll leaves it unchanged.
  pub status: PlaybackStatus,
  volume: u8,
}

impl Player {
  pub fn new(volume: u8) -> Result<Self> {
    let c = constants();
    let http_client = Client::builder()
      .user_agent(c.user_agent.as_str())
      .timeout(Duration::from_secs(c.request_timeout_secs))
      .build()
      .context("Failed to build HTTP client")?;
    Ok(Self {
      http_client,
      current_process: None,
      ipc_socket_path: None,
      current_track: None,
      cover: None,
      status: PlaybackStatus::default(),
      volume: volume.min(100),
    })
  }

  pub fn is_playing(&self) -> bool {
    self.current_process.is_some()
  }

  pub fn volume(&self) -> u8 {
    self.volume
  }

  /// Start streaming a track, replacing whatever was playing before.
  pub async fn play(&mut self, track: Track) -> Result<()> {
    self.stop().await.context("Failed to stop previous playback")?;

    let socket_path = std::env::temp_dir().join(format!("hitmo-mpv-{}.sock", std::process::id()));
    let socket_path_str = socket_path.to_str().context("Temp dir path is not valid UTF-8")?.to_string();
    // Remove stale socket if it exists from a previous crash.
    let _ = std::fs::remove_file(&socket_path);

    let mut cmd = Command::new("mpv");
    cmd.args([
      "--no-video",
      "--really-quiet",
      &format!("--volume={}", self.volume),
      &format!("--input-ipc-server={}", socket_path_str),
      &track.download_url,
    ]);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::null());

    let child = cmd.spawn().map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        anyhow!("mpv not found. Install it with: apt install mpv (Linux) or brew install mpv (macOS)")
      } else {
        anyhow!(e).context("Failed to spawn mpv process")
      }
    })?;

    info!(title = %track.title, artist = %track.artist, "playback started");
    self.current_process = Some(child);
    self.ipc_socket_path = Some(socket_path_str);
    self.current_track = Some(track);
    self.status = PlaybackStatus::default();
    Ok(())
  }

  /// Detect an mpv exit (track finished, or the player died) and clear the
  /// session state so the UI falls back to the stopped view.
  pub fn poll_exit(&mut self) {
    let exited = match self.current_process.as_mut() {
      Some(child) => matches!(child.try_wait(), Ok(Some(_))),
      None => return,
    };
    if exited {
      debug!("mpv exited, clearing playback session");
      self.current_process = None;
      self.current_track = None;
      self.cover = None;
      self.status = PlaybackStatus::default();
      if let Some(path) = self.ipc_socket_path.take() {
        let _ = std::fs::remove_file(&path);
      }
    }
  }

  /// Poll mpv for position/duration/pause. Called from the 1-second tick;
  /// an IPC failure is logged at debug and the displayed status simply does
  /// not update this tick.
  pub async fn refresh_status(&mut self) {
    let Some(socket_path) = self.ipc_socket_path.clone() else { return };
    match query_status(&socket_path).await {
      Ok(Some(status)) => self.status = status,
      // Properties can be unavailable right after spawn; keep the old snapshot.
      Ok(None) => {}
      Err(e) => debug!(err = %e, "playback status poll failed"),
    }
  }

  pub async fn toggle_pause(&mut self) -> Result<()> {
    let Some(ref socket_path) = self.ipc_socket_path else {
      return Ok(());
    };
    ipc_request(socket_path, json!(["cycle", "pause"])).await.context("Failed to send pause command to mpv")?;
    // Optimistic flip; the next tick poll confirms it.
    self.status.paused = !self.status.paused;
    Ok(())
  }

  /// Set the absolute playback position. The caller clamps the target into
  /// `[0, duration]` before handing it over.
  pub async fn seek(&mut self, position: Duration) -> Result<()> {
    let Some(ref socket_path) = self.ipc_socket_path else {
      return Ok(());
    };
    ipc_request(socket_path, json!(["set_property", "time-pos", position.as_secs_f64()]))
      .await
      .context("Failed to send seek command to mpv")?;
    self.status.position = position;
    Ok(())
  }

  /// Set the output volume on a 0–100 scale. Remembered across tracks; the
  /// live mpv instance is updated best-effort.
  pub async fn set_volume(&mut self, volume: u8) {
    self.volume = volume.min(100);
    if let Some(ref socket_path) = self.ipc_socket_path
      && let Err(e) = ipc_request(socket_path, json!(["set_property", "volume", self.volume])).await
    {
      debug!(err = %e, "failed to set mpv volume");
    }
  }

  pub async fn stop(&mut self) -> Result<()> {
    if let Some(mut child) = self.current_process.take() {
      child.kill().await.context("Failed to kill mpv process")?;
      let _ = child.wait().await;
    }
    self.current_track = None;
    self.cover = None;
    self.status = PlaybackStatus::default();
    if let Some(path) = self.ipc_socket_path.take() {
      let _ = std::fs::remove_file(&path);
    }
    Ok(())
  }
}

// --- mpv IPC ---

async fn query_status(socket_path: &str) -> Result<Option<PlaybackStatus>> {
  let Some(position) = get_property(socket_path, "time-pos").await?.as_ref().and_then(Value::as_f64) else {
    return Ok(None);
  };
  let Some(duration) = get_property(socket_path, "duration").await?.as_ref().and_then(Value::as_f64) else {
    return Ok(None);
  };
  let paused = get_property(socket_path, "pause").await?.as_ref().and_then(Value::as_bool).unwrap_or(false);
  Ok(Some(PlaybackStatus {
    position: Duration::from_secs_f64(position.max(0.0)),
    duration: Duration::from_secs_f64(duration.max(0.0)),
    paused,
  }))
}

async fn get_property(socket_path: &str, name: &str) -> Result<Option<Value>> {
  ipc_request(socket_path, json!(["get_property", name])).await
}

/// Send one command to mpv's IPC socket and wait for the matching response.
///
/// Returns `Ok(Some(data))` on success, `Ok(None)` when mpv reports the
/// property as unavailable (normal right after spawn or at end of file).
async fn ipc_request(socket_path: &str, command: Value) -> Result<Option<Value>> {
  let c = constants();
  let mut stream =
    UnixStream::connect(socket_path).await.context("Failed to connect to mpv IPC socket")?;

  let mut payload =
    serde_json::to_vec(&json!({ "command": command, "request_id": 1 })).context("Failed to encode IPC command")?;
  payload.push(b'\n');
  stream.write_all(&payload).await.context("Failed to send command to mpv IPC socket")?;

  let reader = TokioBufReader::new(stream);
  let mut lines = reader.lines();

  // mpv may emit event lines before our response; read a bounded number.
  for _ in 0..c.ipc_max_response_lines {
    let line = tokio::time::timeout(Duration::from_millis(c.ipc_response_timeout_ms), lines.next_line())
      .await
      .context("Timeout waiting for mpv IPC response")?
      .context("Failed to read from mpv IPC socket")?;

    let Some(line) = line else { break };

    if let Ok(val) = serde_json::from_str::<Value>(&line)
      && val.get("request_id").and_then(Value::as_i64) == Some(1)
    {
      if val.get("error").and_then(Value::as_str) == Some("success") {
        return Ok(Some(val.get("data").cloned().unwrap_or(Value::Null)));
      }
      return Ok(None);
    }
  }

  Ok(None)
}
