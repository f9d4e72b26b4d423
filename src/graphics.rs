//! Cover art rendering into terminal cells.
//!
//! Two modes: true-color half-blocks (two pixels per cell via `▀` with
//! foreground/background colors) and a grayscale ASCII ramp fallback.

use image::DynamicImage;
use ratatui::{
  buffer::Buffer,
  layout::Rect,
  style::{Color, Style},
  widgets::Widget,
};

use crate::display::DisplayMode;

pub struct CoverWidget<'a> {
  pub image: &'a DynamicImage,
  pub display_mode: DisplayMode,
}

const ASCII_RAMP: [&str; 10] = [" ", ".", ":", "-", "=", "+", "*", "#", "%", "@"];

impl Widget for CoverWidget<'_> {
  fn render(self, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
      return;
    }
    match self.display_mode {
      DisplayMode::Direct => render_half_blocks(self.image, area, buf),
      DisplayMode::Ascii => render_ascii(self.image, area, buf),
    }
  }
}

fn cell(area: Rect, dx: u32, dy: u32) -> (u16, u16) {
  (area.x.saturating_add(dx.min(u16::MAX as u32) as u16), area.y.saturating_add(dy.min(u16::MAX as u32) as u16))
}

fn render_half_blocks(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  // The caller already resized the image to fit the area; a cell covers a
  // vertical pair of pixels.
  let rgb = image.to_rgb8();
  let width = rgb.width().min(area.width as u32);
  let rows = rgb.height().div_ceil(2).min(area.height as u32);
  let origin_x = (area.width as u32).saturating_sub(width) / 2;
  let origin_y = (area.height as u32).saturating_sub(rows) / 2;

  for row in 0..rows {
    for x in 0..width {
      let upper = rgb.get_pixel(x, row * 2);
      let fg = Color::Rgb(upper[0], upper[1], upper[2]);
      let bg = if row * 2 + 1 < rgb.height() {
        let lower = rgb.get_pixel(x, row * 2 + 1);
        Color::Rgb(lower[0], lower[1], lower[2])
      } else {
        Color::Reset
      };
      let (cx, cy) = cell(area, origin_x + x, origin_y + row);
      buf.set_string(cx, cy, "▀", Style::default().fg(fg).bg(bg));
    }
  }
}

fn render_ascii(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let gray = image.to_luma8();
  let width = gray.width().min(area.width as u32);
  let height = gray.height().min(area.height as u32);
  let origin_x = (area.width as u32).saturating_sub(width) / 2;
  let origin_y = (area.height as u32).saturating_sub(height) / 2;

  for y in 0..height {
    for x in 0..width {
      let luma = gray.get_pixel(x, y)[0] as usize;
      let idx = (luma * (ASCII_RAMP.len() - 1)) / 255;
      let (cx, cy) = cell(area, origin_x + x, origin_y + y);
      buf.set_string(cx, cy, ASCII_RAMP[idx], Style::default());
    }
  }
}
