use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::tmdb::Title;

/// Liked titles, unique by id, kept in the order they were liked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoritesSet {
  titles: Vec<Title>,
}

impl FavoritesSet {
  pub fn contains(&self, id: u64) -> bool {
    self.titles.iter().any(|t| t.id == id)
  }

  /// Remove the title if present, add it otherwise. Returns whether it is now liked.
  pub fn toggle(&mut self, title: &Title) -> bool {
    if let Some(pos) = self.titles.iter().position(|t| t.id == title.id) {
      self.titles.remove(pos);
      false
    } else {
      self.titles.push(title.clone());
      true
    }
  }

  pub fn titles(&self) -> &[Title] {
    &self.titles
  }

  pub fn len(&self) -> usize {
    self.titles.len()
  }

  pub fn is_empty(&self) -> bool {
    self.titles.is_empty()
  }

  fn from_titles(titles: Vec<Title>) -> Self {
    let mut set = Self::default();
    for title in titles {
      if !set.contains(title.id) {
        set.titles.push(title);
      }
    }
    set
  }
}

/// Favorites backed by a JSON file. Loaded once, written on every toggle.
pub struct FavoritesStore {
  path: Option<PathBuf>,
  set: FavoritesSet,
}

impl FavoritesStore {
  /// Load from `path`. A missing or unreadable file yields an empty set.
  pub fn load(path: Option<PathBuf>) -> Self {
    let set = match path.as_deref().map(read_titles) {
      Some(Ok(titles)) => FavoritesSet::from_titles(titles),
      Some(Err(e)) => {
        warn!(err = %format!("{:#}", e), "favorites: starting empty");
        FavoritesSet::default()
      }
      None => FavoritesSet::default(),
    };
    info!(count = set.len(), "favorites loaded");
    Self { path, set }
  }

  pub fn set(&self) -> &FavoritesSet {
    &self.set
  }

  pub fn contains(&self, id: u64) -> bool {
    self.set.contains(id)
  }

  /// Toggle membership and persist. The in-memory set changes even if the
  /// write fails; the error is returned for the caller to surface.
  pub fn toggle(&mut self, title: &Title) -> Result<bool> {
    let liked = self.set.toggle(title);
    info!(title_id = title.id, liked, "favorite toggled");
    self.save()?;
    Ok(liked)
  }

  fn save(&self) -> Result<()> {
    let Some(path) = &self.path else { return Ok(()) };
    if let Some(dir) = path.parent() {
      std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(self.set.titles()).context("Failed to serialize favorites")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
  }
}

fn read_titles(path: &Path) -> Result<Vec<Title>> {
  match std::fs::read_to_string(path) {
    Ok(content) => serde_json::from_str(&content).with_context(|| format!("Corrupt favorites file {}", path.display())),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
    Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
  }
}
