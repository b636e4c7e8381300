//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it is always available with
//! no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // TMDB
  pub api_base_url: String,
  pub image_base_url: String,
  pub trailer_base_url: String,

  // Pagination
  /// A new mood session starts on a page drawn from `1..=random_start_pages`.
  pub random_start_pages: u32,
  /// Rows from the end of the list at which the next page is requested.
  pub proximity_threshold: usize,

  // Detail view
  pub similar_limit: usize,

  // UI
  pub error_dismiss_secs: u64,
  pub spinner_frame_ms: u64,

  // Logging
  pub log_file_prefix: String,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is caught by the test below.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_constants_parse() {
    let c = constants();
    assert!(c.api_base_url.starts_with("https://"));
    assert_eq!(c.random_start_pages, 5);
    assert_eq!(c.similar_limit, 6);
    assert!(c.proximity_threshold > 0);
  }
}
