use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// --- Paths ---

fn project_dirs() -> Option<ProjectDirs> {
  ProjectDirs::from("", "", "moodflix")
}

pub fn prefs_path() -> Option<PathBuf> {
  project_dirs().map(|d| d.config_dir().join("prefs.toml"))
}

pub fn favorites_path() -> Option<PathBuf> {
  project_dirs().map(|d| d.data_dir().join("favorites.json"))
}

pub fn log_dir() -> Option<PathBuf> {
  project_dirs().map(|d| d.data_dir().join("logs"))
}

// --- Preferences ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
  Light,
  Dark,
}

impl ThemeMode {
  pub fn label(self) -> &'static str {
    match self {
      ThemeMode::Light => "light",
      ThemeMode::Dark => "dark",
    }
  }

  pub fn from_config(s: &str) -> Option<Self> {
    match s.to_lowercase().as_str() {
      "light" => Some(ThemeMode::Light),
      "dark" => Some(ThemeMode::Dark),
      _ => None,
    }
  }

  pub fn toggled(self) -> Self {
    match self {
      ThemeMode::Light => ThemeMode::Dark,
      ThemeMode::Dark => ThemeMode::Light,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
  pub theme: ThemeMode,
  pub reduced_motion: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefChange {
  Theme(ThemeMode),
  ReducedMotion(bool),
}

/// On-disk shape. Absent keys fall back to system signals.
#[derive(Serialize, Deserialize, Default, Debug, PartialEq)]
struct PrefsFile {
  theme: Option<String>,
  reduced_motion: Option<bool>,
}

// --- System signals ---

/// Environment hints used as defaults when nothing is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemSignals {
  pub prefers_dark: bool,
  pub prefers_reduced_motion: bool,
}

impl SystemSignals {
  /// Probe the environment.
  ///
  /// - dark: `COLORFGBG` background colour (`fg;bg`), dark unless bg is 7 or 9-15
  /// - reduced motion: `MOODFLIX_REDUCED_MOTION` or `REDUCE_MOTION` truthy, or `TERM=dumb`
  pub fn detect() -> Self {
    let colorfgbg = std::env::var("COLORFGBG").ok();
    let term = std::env::var("TERM").unwrap_or_default();
    let flag = std::env::var("MOODFLIX_REDUCED_MOTION").or_else(|_| std::env::var("REDUCE_MOTION")).ok();
    Self::from_env(colorfgbg.as_deref(), flag.as_deref(), &term)
  }

  fn from_env(colorfgbg: Option<&str>, reduced_motion_flag: Option<&str>, term: &str) -> Self {
    let prefers_dark = colorfgbg
      .and_then(|v| v.rsplit(';').next())
      .and_then(|bg| bg.trim().parse::<u8>().ok())
      .is_none_or(|bg| !(bg == 7 || (9..=15).contains(&bg)));
    let prefers_reduced_motion =
      reduced_motion_flag.is_some_and(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        || term == "dumb";
    Self { prefers_dark, prefers_reduced_motion }
  }
}

// --- Store ---

/// Theme and motion preferences backed by a TOML file. Every change is saved
/// immediately.
pub struct PreferencesStore {
  path: Option<PathBuf>,
  file: PrefsFile,
  current: Preferences,
}

impl PreferencesStore {
  pub fn load(path: Option<PathBuf>, signals: SystemSignals) -> Self {
    let file = path.as_deref().map(read_prefs).unwrap_or_default();
    let current = resolve(&file, signals);
    info!(theme = current.theme.label(), reduced_motion = current.reduced_motion, "preferences loaded");
    Self { path, file, current }
  }

  pub fn get(&self) -> Preferences {
    self.current
  }

  pub fn set(&mut self, change: PrefChange) -> Result<()> {
    match change {
      PrefChange::Theme(theme) => {
        self.current.theme = theme;
        self.file.theme = Some(theme.label().to_string());
      }
      PrefChange::ReducedMotion(on) => {
        self.current.reduced_motion = on;
        self.file.reduced_motion = Some(on);
      }
    }
    info!(?change, "preference changed");
    self.save()
  }

  pub fn toggle_theme(&mut self) -> Result<()> {
    self.set(PrefChange::Theme(self.current.theme.toggled()))
  }

  pub fn toggle_reduced_motion(&mut self) -> Result<()> {
    self.set(PrefChange::ReducedMotion(!self.current.reduced_motion))
  }

  fn save(&self) -> Result<()> {
    let Some(path) = &self.path else { return Ok(()) };
    if let Some(dir) = path.parent() {
      std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let content = toml::to_string(&self.file).context("Failed to serialize preferences")?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
  }
}

fn read_prefs(path: &Path) -> PrefsFile {
  let Ok(content) = std::fs::read_to_string(path) else { return PrefsFile::default() };
  toml::from_str(&content).unwrap_or_else(|e| {
    warn!(path = %path.display(), err = %e, "preferences file unreadable, using defaults");
    PrefsFile::default()
  })
}

fn resolve(file: &PrefsFile, signals: SystemSignals) -> Preferences {
  let fallback_theme = if signals.prefers_dark { ThemeMode::Dark } else { ThemeMode::Light };
  Preferences {
    theme: file.theme.as_deref().and_then(ThemeMode::from_config).unwrap_or(fallback_theme),
    reduced_motion: file.reduced_motion.unwrap_or(signals.prefers_reduced_motion),
  }
}
