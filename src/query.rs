use std::fmt;

use crate::mood::MoodLabel;

/// Catalog sort criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
  PopularityDesc,
  VoteAverageDesc,
}

impl SortKey {
  pub fn as_param(self) -> &'static str {
    match self {
      SortKey::PopularityDesc => "popularity.desc",
      SortKey::VoteAverageDesc => "vote_average.desc",
    }
  }
}

/// Discovery parameters for one mood. Genres are OR-ed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodQuery {
  pub genres: Vec<u32>,
  pub sort: SortKey,
}

impl MoodQuery {
  /// Genre list in the catalog's OR syntax, e.g. `28|12`.
  pub fn genres_param(&self) -> String {
    self.genres.iter().map(u32::to_string).collect::<Vec<_>>().join("|")
  }
}

impl fmt::Display for MoodQuery {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "genres={} sort={}", self.genres_param(), self.sort.as_param())
  }
}

// TMDB movie genre ids
const COMEDY: u32 = 35;
const DRAMA: u32 = 18;
const ACTION: u32 = 28;
const ADVENTURE: u32 = 12;
const ROMANCE: u32 = 10749;

pub fn to_query(mood: MoodLabel) -> MoodQuery {
  let (genres, sort) = match mood {
    MoodLabel::Happy => (vec![COMEDY], SortKey::PopularityDesc),
    MoodLabel::Sad => (vec![DRAMA], SortKey::VoteAverageDesc),
    MoodLabel::Excited => (vec![ACTION, ADVENTURE], SortKey::PopularityDesc),
    MoodLabel::Relaxed => (vec![ROMANCE, DRAMA], SortKey::VoteAverageDesc),
  };
  MoodQuery { genres, sort }
}
