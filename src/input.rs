use anyhow::{Context, Result};
use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, AppMode};
use crate::constants::constants;

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

// --- Event Handling ---

pub async fn handle_key_event(app: &mut App, key: event::KeyEvent) -> Result<()> {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return Ok(());
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('t') {
    app.next_theme();
    return Ok(());
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
    app.stop_playback().await?;
    return Ok(());
  }

  match app.mode {
    AppMode::Input => handle_input_key(app, key).context("Failed to handle search input key")?,
    AppMode::History => handle_history_key(app, key).await?,
    AppMode::Results => handle_results_key(app, key).await?,
  }
  Ok(())
}

fn handle_input_key(app: &mut App, key: event::KeyEvent) -> Result<()> {
  app.clear_error();
  match key.code {
    KeyCode::Enter => {
      app.trigger_search()?;
    }
    KeyCode::Tab => {
      if !app.history.is_empty() {
        app.mode = AppMode::History;
        if app.history_state.selected().is_none() {
          app.history_state.select(Some(0));
        }
      }
    }
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
      app.input.insert(byte_idx, c);
      app.cursor_position += 1;
    }
    KeyCode::Backspace => {
      if app.cursor_position > 0 {
        app.cursor_position -= 1;
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Delete => {
      if app.cursor_position < app.input.chars().count() {
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < app.input.chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.input.chars().count();
    }
    KeyCode::Esc => {
      if !app.input.is_empty() {
        app.input.clear();
        app.cursor_position = 0;
        app.input_scroll = 0;
      } else if !app.search_results.is_empty() {
        app.mode = AppMode::Results;
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down => {
      if !app.search_results.is_empty() {
        app.mode = AppMode::Results;
      }
    }
    _ => {}
  }
  Ok(())
}

async fn handle_history_key(app: &mut App, key: event::KeyEvent) -> Result<()> {
  if handle_transport_key(app, key).await {
    return Ok(());
  }
  match key.code {
    KeyCode::Enter => {
      app.search_from_history().context("Failed to re-run history entry")?;
      app.mode = AppMode::Input;
    }
    KeyCode::Down | KeyCode::Char('j') => {
      select_next(&mut app.history_state, app.history.entries().len());
    }
    KeyCode::Up | KeyCode::Char('k') => {
      select_prev(&mut app.history_state, app.history.entries().len());
    }
    KeyCode::Tab => {
      if !app.search_results.is_empty() {
        app.mode = AppMode::Results;
      } else {
        app.mode = AppMode::Input;
      }
    }
    KeyCode::Esc => {
      app.mode = AppMode::Input;
    }
    _ => {}
  }
  Ok(())
}

async fn handle_results_key(app: &mut App, key: event::KeyEvent) -> Result<()> {
  if handle_transport_key(app, key).await {
    return Ok(());
  }
  match key.code {
    KeyCode::Enter => {
      app.trigger_play().await;
    }
    KeyCode::Down | KeyCode::Char('j') => {
      select_next(&mut app.results_state, app.search_results.len());
    }
    KeyCode::Up | KeyCode::Char('k') => {
      select_prev(&mut app.results_state, app.search_results.len());
    }
    KeyCode::Tab => {
      if !app.history.is_empty() {
        app.mode = AppMode::History;
        if app.history_state.selected().is_none() {
          app.history_state.select(Some(0));
        }
      }
    }
    KeyCode::Esc => {
      app.mode = AppMode::Input;
    }
    _ => {}
  }
  Ok(())
}

/// Transport keys shared by the non-typing panes. Returns true when the key
/// was consumed.
async fn handle_transport_key(app: &mut App, key: event::KeyEvent) -> bool {
  let c = constants();
  match key.code {
    KeyCode::Char(' ') => {
      app.toggle_pause().await;
    }
    KeyCode::Left => {
      app.seek_by(-c.seek_step_secs).await;
    }
    KeyCode::Right => {
      app.seek_by(c.seek_step_secs).await;
    }
    // Digit keys jump to tenths of the track on the slider scale.
    KeyCode::Char(d @ '0'..='9') => {
      let permille = (d as u16 - '0' as u16) * (c.seek_slider_scale / 10);
      app.seek_to_permille(permille).await;
    }
    KeyCode::Char('+') | KeyCode::Char('=') => {
      app.adjust_volume(c.volume_step as i16).await;
    }
    KeyCode::Char('-') | KeyCode::Char('_') => {
      app.adjust_volume(-(c.volume_step as i16)).await;
    }
    _ => return false,
  }
  true
}

fn select_next(state: &mut ratatui::widgets::ListState, count: usize) {
  if count > 0 {
    let i = state.selected().map_or(0, |i| (i + 1) % count);
    state.select(Some(i));
  }
}

fn select_prev(state: &mut ratatui::widgets::ListState, count: usize) {
  if count > 0 {
    let i = state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 });
    state.select(Some(i));
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("track", 0), 0);
    assert_eq!(char_to_byte_index("track", 4), 4);
    assert_eq!(char_to_byte_index("track", 9), 5); // past end
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "пой"; // each Cyrillic char is 2 bytes
    assert_eq!(char_to_byte_index(s, 0), 0);
    assert_eq!(char_to_byte_index(s, 1), 2);
    assert_eq!(char_to_byte_index(s, 2), 4);
    assert_eq!(char_to_byte_index(s, 3), 6); // past end
  }

  // --- list selection ---

  #[test]
  fn select_next_wraps_around() {
    let mut state = ratatui::widgets::ListState::default();
    select_next(&mut state, 3);
    assert_eq!(state.selected(), Some(0));
    select_next(&mut state, 3);
    select_next(&mut state, 3);
    select_next(&mut state, 3);
    assert_eq!(state.selected(), Some(0));
  }

  #[test]
  fn select_prev_wraps_to_last() {
    let mut state = ratatui::widgets::ListState::default();
    state.select(Some(0));
    select_prev(&mut state, 3);
    assert_eq!(state.selected(), Some(2));
  }

  #[test]
  fn selection_on_empty_list_stays_unselected() {
    let mut state = ratatui::widgets::ListState::default();
    select_next(&mut state, 0);
    select_prev(&mut state, 0);
    assert_eq!(state.selected(), None);
  }
}
