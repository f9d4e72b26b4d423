//! Desktop notification for the now-playing track. Best-effort: a missing
//! notification daemon must never affect playback.

use notify_rust::Notification;
use tracing::debug;

pub fn now_playing(summary: &str) {
  let summary = summary.to_string();
  // Showing a notification can block on the session bus; keep it off the
  // event loop.
  tokio::task::spawn_blocking(move || {
    if let Err(e) = Notification::new().summary("Now playing").body(&summary).timeout(3000).show() {
      debug!(err = %e, "failed to show notification");
    }
  });
}
