use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

// --- Mood labels ---

/// The fixed set of moods. Declaration order is the tie-break priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoodLabel {
  Happy,
  Sad,
  Excited,
  Relaxed,
}

impl MoodLabel {
  pub const ALL: [MoodLabel; 4] = [MoodLabel::Happy, MoodLabel::Sad, MoodLabel::Excited, MoodLabel::Relaxed];

  pub fn label(self) -> &'static str {
    match self {
      MoodLabel::Happy => "happy",
      MoodLabel::Sad => "sad",
      MoodLabel::Excited => "excited",
      MoodLabel::Relaxed => "relaxed",
    }
  }
}

impl fmt::Display for MoodLabel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

impl FromStr for MoodLabel {
  type Err = MoodError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = s.trim().to_lowercase();
    MoodLabel::ALL.into_iter().find(|m| m.label() == wanted).ok_or(MoodError::UnknownMood(s.to_string()))
  }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MoodError {
  #[error("Please describe your mood first.")]
  EmptyInput,

  #[error("Unknown mood '{0}' (expected happy, sad, excited or relaxed)")]
  UnknownMood(String),
}

// --- Classifier ---

/// Score added to a mood when any of its keywords is present.
const KEYWORD_WEIGHT: u32 = 3;

/// Keyword patterns in `MoodLabel::ALL` order. Matching is substring-based,
/// so "sadness" counts for sad and "goodbye" counts for happy.
static PATTERNS: LazyLock<[(MoodLabel, Regex); 4]> = LazyLock::new(|| {
  let build = |p: &str| Regex::new(p).expect("mood keyword pattern must compile");
  [
    (MoodLabel::Happy, build("happy|joy|great|good|awesome|fun|smile")),
    (MoodLabel::Sad, build("sad|down|lonely|depressed|cry|heartbroken|loss")),
    (MoodLabel::Excited, build("action|thrill|hyped|energetic|adrenaline|intense")),
    (MoodLabel::Relaxed, build("calm|relaxed|chill|peaceful|slow|quiet|tired")),
  ]
});

/// Per-mood scores for `text`, in `MoodLabel::ALL` order.
pub fn scores(text: &str) -> [(MoodLabel, u32); 4] {
  let lowered = text.to_lowercase();
  PATTERNS.each_ref().map(|(mood, re)| (*mood, if re.is_match(&lowered) { KEYWORD_WEIGHT } else { 0 }))
}

/// Map free text to a mood. Highest score wins; ties (including no hits at all)
/// go to the earliest-declared mood.
pub fn classify(text: &str) -> MoodLabel {
  let mut best = (MoodLabel::ALL[0], 0);
  for (mood, score) in scores(text) {
    if score > best.1 {
      best = (mood, score);
    }
  }
  best.0
}

/// Validate user input and classify it. Blank input is a usage error.
pub fn analyze(text: &str) -> Result<MoodLabel, MoodError> {
  let text = text.trim();
  if text.is_empty() {
    return Err(MoodError::EmptyInput);
  }
  Ok(classify(text))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classify_happy_keywords() {
    assert_eq!(classify("I feel great and happy today"), MoodLabel::Happy);
    assert_eq!(classify("Something FUN please"), MoodLabel::Happy);
  }

  #[test]
  fn classify_sad_keywords() {
    assert_eq!(classify("lonely and heartbroken"), MoodLabel::Sad);
    assert_eq!(classify("I want to cry"), MoodLabel::Sad);
  }

  #[test]
  fn classify_excited_keywords() {
    assert_eq!(classify("need some ADRENALINE"), MoodLabel::Excited);
    assert_eq!(classify("hyped for an intense night"), MoodLabel::Excited);
  }

  #[test]
  fn classify_relaxed_keywords() {
    assert_eq!(classify("tired, want something quiet"), MoodLabel::Relaxed);
    assert_eq!(classify("chill evening"), MoodLabel::Relaxed);
  }

  #[test]
  fn classify_without_keywords_is_deterministic_default() {
    for _ in 0..10 {
      assert_eq!(classify("xyzzy"), MoodLabel::Happy);
    }
  }

  #[test]
  fn classify_tie_goes_to_first_declared() {
    // sad + relaxed both hit once
    assert_eq!(classify("sad but calm"), MoodLabel::Sad);
    // excited + relaxed
    assert_eq!(classify("action, then chill"), MoodLabel::Excited);
  }

  #[test]
  fn scores_count_presence_not_repetition() {
    let s = scores("happy happy joy joy");
    assert_eq!(s[0], (MoodLabel::Happy, 3));
    assert!(s[1..].iter().all(|(_, score)| *score == 0));
  }

  #[test]
  fn analyze_rejects_blank_input() {
    assert_eq!(analyze(""), Err(MoodError::EmptyInput));
    assert_eq!(analyze("   \t"), Err(MoodError::EmptyInput));
    assert_eq!(analyze(" chill "), Ok(MoodLabel::Relaxed));
  }

  #[test]
  fn mood_from_str() {
    assert_eq!("Excited".parse::<MoodLabel>(), Ok(MoodLabel::Excited));
    assert_eq!(" relaxed ".parse::<MoodLabel>(), Ok(MoodLabel::Relaxed));
    assert!("angry".parse::<MoodLabel>().is_err());
  }
}
