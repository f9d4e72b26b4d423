use image::imageops::FilterType;
use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, Gauge, List, ListItem, Padding, Paragraph},
};
use std::time::Duration;

use crate::app::{App, AppMode};
use crate::graphics::CoverWidget;
use crate::theme::Theme;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

/// Format a playback offset as `MM:SS`. Minutes run past 59 for long tracks.
pub fn format_time(d: Duration) -> String {
  let secs = d.as_secs();
  format!("{:02}:{:02}", secs / 60, secs % 60)
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let now_playing_height = if app.player.current_track.is_some() { 9 } else { 0 };
  let [header_area, input_area, main_area, playing_area, status_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Min(3),
    Constraint::Length(now_playing_height),
    Constraint::Length(1),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, theme, header_area);
  render_input(frame, app, input_area);

  let [history_area, results_area] =
    Layout::horizontal([Constraint::Percentage(30), Constraint::Percentage(70)]).areas(main_area);
  render_history(frame, app, history_area);
  render_results(frame, app, results_area);

  if now_playing_height > 0 {
    render_now_playing(frame, app, playing_area);
  }
  render_status(frame, app, status_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, theme: &Theme, area: Rect) {
  let left = Line::from(Span::styled(" ♪ hitmo ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let border_color = if app.mode == AppMode::Input { theme.accent } else { theme.border };
  let input_block = Block::bordered()
    .title(" Search ")
    .title_style(Style::default().fg(border_color))
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&app.input, app.cursor_position);

  if cursor_col < app.input_scroll {
    app.input_scroll = cursor_col;
  } else if cursor_col >= app.input_scroll + inner_w {
    app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = app
    .input
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.input_scroll)
    .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  if app.mode == AppMode::Input {
    let cursor_x = area.x + 2 + (cursor_col - app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_history(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let focused = app.mode == AppMode::History;
  let border_color = if focused { theme.accent } else { theme.border };

  let inner_w = area.width.saturating_sub(4) as usize;
  let items: Vec<ListItem> = app
    .history
    .entries()
    .iter()
    .enumerate()
    .map(|(i, entry)| {
      let bg = if i % 2 == 1 { theme.stripe_bg } else { theme.bg };
      ListItem::new(Line::from(Span::styled(truncate_str(entry, inner_w), Style::default().fg(theme.fg)))).bg(bg)
    })
    .collect();

  let list = List::new(items)
    .block(
      Block::bordered()
        .title(" History ")
        .title_style(Style::default().fg(border_color))
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(border_color)),
    )
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, area, &mut app.history_state);
}

fn render_results(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let focused = app.mode == AppMode::Results;
  let border_color = if focused { theme.accent } else { theme.border };
  let block = Block::bordered()
    .title(" Results ")
    .title_style(Style::default().fg(border_color))
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(border_color));

  // Explicit indicator: an empty pane is ambiguous, "nothing found" is not.
  if app.no_results {
    let text = vec![
      Line::from(""),
      Line::from(Span::styled("No tracks found.", Style::default().fg(theme.muted).add_modifier(Modifier::BOLD))),
      Line::from(Span::styled("Try another query.", Style::default().fg(theme.muted))),
    ];
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center).block(block), area);
    return;
  }

  if app.search_results.is_empty() {
    let text = vec![
      Line::from(""),
      Line::from(Span::styled("Search the catalog to list tracks.", Style::default().fg(theme.muted))),
    ];
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center).block(block), area);
    return;
  }

  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;
  let items: Vec<ListItem> = app
    .search_results
    .iter()
    .enumerate()
    .map(|(i, track)| {
      let is_selected = Some(i) == app.results_state.selected();
      let fg = if is_selected { theme.highlight_fg } else { theme.fg };
      let bg = if is_selected {
        theme.highlight_bg
      } else if i % 2 == 1 {
        theme.stripe_bg
      } else {
        theme.bg
      };
      let label = format!("{} — {}", track.artist, track.title);
      ListItem::new(Line::from(Span::styled(truncate_str(&label, inner_w), Style::default().fg(fg)))).bg(bg)
    })
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, area, &mut app.results_state);
}

fn render_now_playing(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let block = Block::bordered()
    .title(" Now Playing ")
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
    .padding(Padding::horizontal(1));
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let [cover_area, info_area] = Layout::horizontal([Constraint::Length(15), Constraint::Min(10)]).areas(inner);

  if let Some(ref cover) = app.player.cover {
    // Half-block cells pack two pixels vertically; the resize keeps aspect
    // and the widget centers the result.
    let target_w = cover_area.width.max(1) as u32;
    let target_h = (cover_area.height.max(1) as u32) * 2;
    let resized = cover.resize(target_w, target_h, FilterType::Lanczos3);
    frame.render_widget(CoverWidget { image: &resized, display_mode: app.display_mode }, cover_area);
  }

  let Some(ref track) = app.player.current_track else { return };
  let status = app.player.status;
  let inner_w = info_area.width.saturating_sub(1) as usize;

  let state_label = if status.paused { "⏸ Paused" } else { "▶ Playing" };
  let time_label = format!("{} / {}", format_time(status.position), format_time(status.duration));

  let [title_row, artist_row, _, time_row, seek_row, _, volume_row] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Length(1),
  ])
  .areas(info_area);

  frame.render_widget(
    Paragraph::new(truncate_str(&track.title, inner_w)).style(Style::default().fg(theme.fg).add_modifier(Modifier::BOLD)),
    title_row,
  );
  frame.render_widget(Paragraph::new(truncate_str(&track.artist, inner_w)).style(Style::default().fg(theme.muted)), artist_row);
  frame.render_widget(
    Paragraph::new(Line::from(vec![
      Span::styled(state_label, Style::default().fg(theme.accent)),
      Span::raw("   "),
      Span::styled(time_label, Style::default().fg(theme.fg)),
    ])),
    time_row,
  );

  let ratio = if status.duration.is_zero() {
    0.0
  } else {
    (status.position.as_secs_f64() / status.duration.as_secs_f64()).clamp(0.0, 1.0)
  };
  frame.render_widget(
    Gauge::default().gauge_style(Style::default().fg(theme.accent).bg(theme.stripe_bg)).ratio(ratio).label(""),
    seek_row,
  );

  let volume = app.player.volume();
  frame.render_widget(
    Gauge::default()
      .gauge_style(Style::default().fg(theme.status).bg(theme.stripe_bg))
      .ratio(volume as f64 / 100.0)
      .label(format!("Vol {}%", volume)),
    volume_row,
  );
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(ref track) = app.player.current_track {
    (format!(" ♪ {} — {}", track.artist, track.title), Style::default().fg(theme.status))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let is_playing = app.player.is_playing();
  let keys: Vec<(&str, &str)> = match app.mode {
    AppMode::Input => {
      let mut k = vec![("Enter", "Search"), ("Tab", "History"), ("^t", "Theme")];
      if is_playing {
        k.push(("^s", "Stop"));
      }
      if !app.search_results.is_empty() {
        k.push(("↓", "Results"));
      }
      k.push(("Esc", "Quit"));
      k
    }
    AppMode::History => {
      vec![("Enter", "Re-search"), ("j/k", "Navigate"), ("Tab", "Results"), ("Esc", "Back")]
    }
    AppMode::Results => {
      let mut k = vec![("Enter", "Play"), ("j/k", "Navigate")];
      if is_playing {
        let pause_label = if app.player.status.paused { "Resume" } else { "Pause" };
        k.push(("Space", pause_label));
        k.push(("←/→", "Seek"));
        k.push(("0-9", "Jump"));
        k.push(("+/-", "Volume"));
      }
      k.push(("Esc", "Back"));
      k
    }
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw(" "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

#[cfg(test)]
mod tests {
  use super::*;

  // --- format_time ---

  #[test]
  fn format_time_zero() {
    assert_eq!(format_time(Duration::ZERO), "00:00");
  }

  #[test]
  fn format_time_sub_minute() {
    assert_eq!(format_time(Duration::from_secs(7)), "00:07");
  }

  #[test]
  fn format_time_minutes() {
    assert_eq!(format_time(Duration::from_secs(3 * 60 + 25)), "03:25");
  }

  #[test]
  fn format_time_runs_past_an_hour() {
    assert_eq!(format_time(Duration::from_secs(73 * 60 + 15)), "73:15");
  }

  // --- truncate_str ---

  #[test]
  fn truncate_short_strings_unchanged() {
    assert_eq!(truncate_str("abc", 10), "abc");
  }

  #[test]
  fn truncate_appends_ellipsis() {
    assert_eq!(truncate_str("abcdefgh", 5), "abcd…");
  }
}
