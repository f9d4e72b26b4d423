use ratatui::style::Color;

/// A named color scheme. Cycled at runtime with Ctrl+T and remembered in the
/// user prefs file.
pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub muted: Color,
  pub accent: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub static THEMES: [Theme; 3] = [
  Theme {
    name: "midnight",
    bg: Color::Rgb(16, 18, 28),
    fg: Color::Rgb(205, 214, 244),
    muted: Color::Rgb(108, 112, 134),
    accent: Color::Rgb(137, 180, 250),
    border: Color::Rgb(49, 50, 68),
    highlight_fg: Color::Rgb(17, 17, 27),
    highlight_bg: Color::Rgb(137, 180, 250),
    stripe_bg: Color::Rgb(24, 24, 37),
    status: Color::Rgb(166, 227, 161),
    error: Color::Rgb(243, 139, 168),
    key_fg: Color::Rgb(17, 17, 27),
    key_bg: Color::Rgb(108, 112, 134),
  },
  Theme {
    name: "ember",
    bg: Color::Rgb(28, 20, 16),
    fg: Color::Rgb(235, 219, 178),
    muted: Color::Rgb(146, 131, 116),
    accent: Color::Rgb(254, 128, 25),
    border: Color::Rgb(60, 56, 54),
    highlight_fg: Color::Rgb(29, 32, 33),
    highlight_bg: Color::Rgb(254, 128, 25),
    stripe_bg: Color::Rgb(40, 32, 26),
    status: Color::Rgb(184, 187, 38),
    error: Color::Rgb(251, 73, 52),
    key_fg: Color::Rgb(29, 32, 33),
    key_bg: Color::Rgb(146, 131, 116),
  },
  Theme {
    name: "paper",
    bg: Color::Rgb(242, 238, 230),
    fg: Color::Rgb(60, 56, 54),
    muted: Color::Rgb(146, 131, 116),
    accent: Color::Rgb(7, 102, 120),
    border: Color::Rgb(204, 196, 180),
    highlight_fg: Color::Rgb(242, 238, 230),
    highlight_bg: Color::Rgb(7, 102, 120),
    stripe_bg: Color::Rgb(232, 226, 214),
    status: Color::Rgb(121, 116, 14),
    error: Color::Rgb(157, 0, 6),
    key_fg: Color::Rgb(242, 238, 230),
    key_bg: Color::Rgb(146, 131, 116),
  },
];
