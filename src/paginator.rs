//! Mood session pagination.
//!
//! The paginator never touches the network. It hands out [`FetchRequest`]s
//! and is told how they ended via [`Paginator::complete`]. Requests carry the
//! session they were issued for, so a response that arrives after the mood
//! changed is dropped instead of appended.

use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::mood::MoodLabel;
use crate::query::{MoodQuery, to_query};
use crate::tmdb::{ResultPage, Title};

/// What moved the paginator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
  /// A new mood was chosen. `start_page` is the randomly drawn first page.
  MoodSelected { mood: MoodLabel, start_page: u32 },
  /// The user scrolled near the end of the loaded titles.
  Proximity,
}

/// A page the caller should fetch and report back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
  pub session: u64,
  pub mood: MoodLabel,
  pub query: MoodQuery,
  pub page: u32,
}

/// How a completed fetch was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
  Appended { added: usize },
  Exhausted,
  Failed,
  Stale,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaginationState {
  /// Last page applied; 0 until the first page lands.
  pub current_page: u32,
  pub titles: Vec<Title>,
  pub exhausted: bool,
}

#[derive(Debug, Default)]
pub struct Paginator {
  session: u64,
  mood: Option<MoodLabel>,
  /// Page the next request asks for. Only advances on success, so a failed
  /// page is retried by the next proximity signal.
  next_page: u32,
  loading: bool,
  seen: HashSet<u64>,
  state: PaginationState,
}

impl Paginator {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn mood(&self) -> Option<MoodLabel> {
    self.mood
  }

  pub fn state(&self) -> &PaginationState {
    &self.state
  }

  pub fn titles(&self) -> &[Title] {
    &self.state.titles
  }

  pub fn is_loading(&self) -> bool {
    self.loading
  }

  pub fn is_exhausted(&self) -> bool {
    self.state.exhausted
  }

  pub fn advance(&mut self, signal: Signal) -> Option<FetchRequest> {
    match signal {
      Signal::MoodSelected { mood, start_page } => {
        self.reset(Some(mood));
        self.next_page = start_page.max(1);
        info!(session = self.session, mood = %mood, start_page = self.next_page, "mood session started");
        Some(self.issue(mood))
      }
      Signal::Proximity => {
        let mood = self.mood?;
        if self.loading || self.state.exhausted {
          return None;
        }
        debug!(session = self.session, page = self.next_page, "proximity fetch");
        Some(self.issue(mood))
      }
    }
  }

  /// Leave the current session. Any response still in flight becomes stale.
  pub fn clear(&mut self) {
    self.reset(None);
  }

  pub fn complete(&mut self, request: &FetchRequest, result: anyhow::Result<ResultPage>) -> Applied {
    if request.session != self.session || self.mood.is_none() {
      debug!(session = request.session, live = self.session, page = request.page, "stale page dropped");
      return Applied::Stale;
    }
    self.loading = false;

    let page = match result {
      Ok(page) => page,
      Err(e) => {
        warn!(session = self.session, page = request.page, err = %e, "page fetch failed");
        return Applied::Failed;
      }
    };

    if page.page != request.page || page.query != request.query {
      warn!(
        session = self.session,
        asked = request.page,
        got = page.page,
        query = %page.query,
        "page does not answer its request"
      );
      return Applied::Failed;
    }

    let fresh: Vec<Title> = page.titles.into_iter().filter(|t| self.seen.insert(t.id)).collect();
    if fresh.is_empty() {
      info!(session = self.session, page = request.page, total = self.state.titles.len(), "results exhausted");
      self.state.exhausted = true;
      return Applied::Exhausted;
    }

    let added = fresh.len();
    self.state.titles.extend(fresh);
    self.state.current_page = page.page;
    self.next_page = page.page + 1;
    Applied::Appended { added }
  }

  fn reset(&mut self, mood: Option<MoodLabel>) {
    self.session += 1;
    self.mood = mood;
    self.next_page = 1;
    self.loading = false;
    self.seen.clear();
    self.state = PaginationState::default();
  }

  fn issue(&mut self, mood: MoodLabel) -> FetchRequest {
    self.loading = true;
    FetchRequest { session: self.session, mood, query: to_query(mood), page: self.next_page }
  }
}
