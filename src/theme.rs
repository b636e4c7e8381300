use ratatui::style::Color;

use crate::prefs::ThemeMode;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub secondary: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub error: Color,
  pub liked: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub static DARK: Theme = Theme {
  name: "dark",
  bg: Color::Rgb(0, 0, 0),
  fg: Color::Rgb(255, 255, 255),
  accent: Color::Rgb(10, 132, 255),
  secondary: Color::Rgb(94, 92, 230),
  muted: Color::Rgb(161, 161, 166),
  border: Color::Rgb(58, 58, 60),
  highlight_fg: Color::Rgb(255, 255, 255),
  highlight_bg: Color::Rgb(28, 28, 30),
  stripe_bg: Color::Rgb(12, 12, 14),
  status: Color::Rgb(100, 210, 255),
  error: Color::Rgb(255, 159, 10),
  liked: Color::Rgb(255, 69, 58),
  key_fg: Color::Rgb(0, 0, 0),
  key_bg: Color::Rgb(161, 161, 166),
};

pub static LIGHT: Theme = Theme {
  name: "light",
  bg: Color::Rgb(245, 245, 247),
  fg: Color::Rgb(29, 29, 31),
  accent: Color::Rgb(10, 132, 255),
  secondary: Color::Rgb(94, 92, 230),
  muted: Color::Rgb(110, 110, 115),
  border: Color::Rgb(210, 210, 215),
  highlight_fg: Color::Rgb(29, 29, 31),
  highlight_bg: Color::Rgb(255, 255, 255),
  stripe_bg: Color::Rgb(236, 236, 240),
  status: Color::Rgb(0, 113, 227),
  error: Color::Rgb(201, 52, 0),
  liked: Color::Rgb(215, 0, 21),
  key_fg: Color::Rgb(255, 255, 255),
  key_bg: Color::Rgb(110, 110, 115),
};

pub fn for_mode(mode: ThemeMode) -> &'static Theme {
  match mode {
    ThemeMode::Light => &LIGHT,
    ThemeMode::Dark => &DARK,
  }
}
