use anyhow::anyhow;
use rand::Rng;
use rand::seq::SliceRandom;
use ratatui::widgets::ListState;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::constants::constants;
use crate::favorites::FavoritesStore;
use crate::mood::{self, MoodLabel};
use crate::paginator::{Applied, FetchRequest, Paginator, Signal};
use crate::prefs::PreferencesStore;
use crate::theme::{self, Theme};
use crate::tmdb::{CatalogClient, ResultPage, Title, TitleDetail};

// --- Types ---

pub type PageResult = anyhow::Result<ResultPage>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
  Discover,
  Liked,
}

/// Where keyboard focus is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  /// Mood prompt on the Discover tab.
  Input,
  /// A title list: mood results or liked titles, depending on the tab.
  Results,
  Detail,
}

/// The open detail view. `generation` ties it to the in-flight lookup.
pub struct DetailView {
  pub title: Title,
  pub generation: u64,
  pub trailer_key: Option<String>,
  pub similar: Vec<Title>,
  pub similar_state: ListState,
  pub loading: bool,
  return_mode: AppMode,
}

/// In-flight async task receivers.
#[derive(Default)]
pub(crate) struct AsyncTasks {
  pub(crate) page_rx: Option<(FetchRequest, oneshot::Receiver<PageResult>)>,
  pub(crate) detail_rx: Option<(u64, oneshot::Receiver<TitleDetail>)>,
}

pub struct App {
  pub input: String,
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub mode: AppMode,
  pub tab: Tab,
  pub results_state: ListState,
  pub liked_state: ListState,
  pub paginator: Paginator,
  pub favorites: FavoritesStore,
  pub prefs: PreferencesStore,
  pub detail: Option<DetailView>,
  pub last_error: Option<String>,
  pub status_message: Option<String>,
  pub should_quit: bool,
  /// App start instant, used to drive the loading spinner.
  pub started_at: Instant,
  catalog: CatalogClient,
  pub(crate) tasks: AsyncTasks,
  detail_generation: u64,
  /// When the last error was set, for auto-dismiss.
  error_time: Option<Instant>,
}

impl App {
  pub fn new(catalog: CatalogClient, favorites: FavoritesStore, prefs: PreferencesStore) -> Self {
    Self {
      input: String::new(),
      cursor_position: 0,
      input_scroll: 0,
      mode: AppMode::Input,
      tab: Tab::Discover,
      results_state: ListState::default(),
      liked_state: ListState::default(),
      paginator: Paginator::new(),
      favorites,
      prefs,
      detail: None,
      last_error: None,
      status_message: None,
      should_quit: false,
      started_at: Instant::now(),
      catalog,
      tasks: AsyncTasks::default(),
      detail_generation: 0,
      error_time: None,
    }
  }

  pub fn theme(&self) -> &'static Theme {
    theme::for_mode(self.prefs.get().theme)
  }

  /// Loading indicator glyph. Static when reduced motion is on.
  pub fn spinner(&self) -> &'static str {
    const FRAMES: [&str; 8] = ["⠋", "⠙", "⠸", "⠴", "⠦", "⠇", "⠏", "⠹"];
    if self.prefs.get().reduced_motion {
      return "…";
    }
    let tick = self.started_at.elapsed().as_millis() / u128::from(constants().spinner_frame_ms.max(1));
    FRAMES[(tick % FRAMES.len() as u128) as usize]
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  /// Clear the current error message and its expiry timer.
  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_dismiss_secs)
    {
      self.last_error = None;
      self.error_time = None;
    }
  }

  // --- Preferences ---

  pub fn toggle_theme(&mut self) {
    if let Err(e) = self.prefs.toggle_theme() {
      warn!(err = %format!("{:#}", e), "failed to save theme");
      self.set_error(format!("Failed to save preferences: {:#}", e));
    }
  }

  pub fn toggle_reduced_motion(&mut self) {
    if let Err(e) = self.prefs.toggle_reduced_motion() {
      warn!(err = %format!("{:#}", e), "failed to save reduced motion");
      self.set_error(format!("Failed to save preferences: {:#}", e));
    }
  }

  // --- Mood sessions ---

  /// Classify the prompt text and start a session for the result.
  pub fn analyze_input(&mut self) {
    match mood::analyze(&self.input) {
      Ok(mood) => {
        info!(mood = %mood, "mood analyzed");
        self.start_mood(mood);
      }
      Err(e) => self.set_error(e.to_string()),
    }
  }

  pub fn surprise(&mut self) {
    let mood = *MoodLabel::ALL.choose(&mut rand::thread_rng()).unwrap_or(&MoodLabel::ALL[0]);
    info!(mood = %mood, "surprise mood");
    self.start_mood(mood);
  }

  pub fn start_mood(&mut self, mood: MoodLabel) {
    let start_page = rand::thread_rng().gen_range(1..=constants().random_start_pages.max(1));
    self.clear_error();
    self.tab = Tab::Discover;
    self.mode = AppMode::Results;
    self.results_state.select(None);
    if let Some(request) = self.paginator.advance(Signal::MoodSelected { mood, start_page }) {
      self.spawn_page(request);
    }
  }

  /// Leave the results and return to the mood prompt.
  pub fn back_to_prompt(&mut self) {
    self.paginator.clear();
    self.tasks.page_rx = None;
    self.results_state.select(None);
    self.status_message = None;
    self.mode = AppMode::Input;
  }

  /// Raise a proximity signal; fetches the next page if the session allows it.
  pub fn load_more(&mut self) {
    if let Some(request) = self.paginator.advance(Signal::Proximity) {
      self.spawn_page(request);
    }
  }

  fn spawn_page(&mut self, request: FetchRequest) {
    self.status_message = Some(format!("Finding {} movies…", request.mood));
    let catalog = self.catalog.clone();
    let (query, page) = (request.query.clone(), request.page);
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(catalog.discover(&query, page).await.map_err(anyhow::Error::from));
    });
    self.tasks.page_rx = Some((request, rx));
  }

  /// Whether `index` is close enough to the end of `len` rows to prefetch.
  pub fn is_near_end(index: usize, len: usize) -> bool {
    index + constants().proximity_threshold >= len
  }

  // --- Detail view ---

  pub fn open_detail(&mut self, title: Title) {
    self.detail_generation += 1;
    let generation = self.detail_generation;
    let return_mode = match &self.detail {
      Some(view) => view.return_mode,
      None => self.mode,
    };
    info!(title_id = title.id, generation, "detail opened");

    let catalog = self.catalog.clone();
    let title_id = title.id;
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(catalog.detail(title_id).await);
    });
    self.tasks.detail_rx = Some((generation, rx));

    self.detail = Some(DetailView {
      title,
      generation,
      trailer_key: None,
      similar: Vec::new(),
      similar_state: ListState::default(),
      loading: true,
      return_mode,
    });
    self.mode = AppMode::Detail;
  }

  pub fn close_detail(&mut self) {
    if let Some(view) = self.detail.take() {
      self.mode = view.return_mode;
    }
    self.tasks.detail_rx = None;
  }

  pub fn open_selected_similar(&mut self) {
    let Some(view) = &self.detail else { return };
    let Some(title) = view.similar_state.selected().and_then(|i| view.similar.get(i)).cloned() else { return };
    self.open_detail(title);
  }

  pub fn trailer_url(&self) -> Option<String> {
    let key = self.detail.as_ref()?.trailer_key.as_ref()?;
    Some(format!("{}{}", constants().trailer_base_url, key))
  }

  pub fn open_trailer(&mut self) {
    let Some(url) = self.trailer_url() else {
      self.set_error("No trailer available.".to_string());
      return;
    };
    // Use platform-appropriate command to open URL in default browser.
    #[cfg(target_os = "macos")]
    let cmd = "open";
    #[cfg(not(target_os = "macos"))]
    let cmd = "xdg-open";
    match std::process::Command::new(cmd)
      .arg(&url)
      .stdin(std::process::Stdio::null())
      .stdout(std::process::Stdio::null())
      .stderr(std::process::Stdio::null())
      .spawn()
    {
      Ok(mut child) => {
        // Reap the child in a background thread to avoid zombie processes.
        std::thread::spawn(move || {
          let _ = child.wait();
        });
      }
      Err(e) => {
        self.set_error(format!("Failed to open browser: {}", e));
      }
    }
  }

  // --- Tabs & selection ---

  pub fn switch_tab(&mut self) {
    if self.mode == AppMode::Detail {
      return;
    }
    match self.tab {
      Tab::Discover => {
        self.tab = Tab::Liked;
        self.mode = AppMode::Results;
        self.clamp_liked_selection();
      }
      Tab::Liked => {
        self.tab = Tab::Discover;
        self.mode = if self.paginator.mood().is_some() { AppMode::Results } else { AppMode::Input };
      }
    }
  }

  /// Title under the cursor in the focused list.
  pub fn selected_title(&self) -> Option<&Title> {
    match (self.mode, self.tab) {
      (AppMode::Detail, _) => self.detail.as_ref().map(|v| &v.title),
      (AppMode::Results, Tab::Discover) => self.results_state.selected().and_then(|i| self.paginator.titles().get(i)),
      (AppMode::Results, Tab::Liked) => {
        self.liked_state.selected().and_then(|i| self.favorites.set().titles().get(i))
      }
      (AppMode::Input, _) => None,
    }
  }

  pub fn open_selected(&mut self) {
    if let Some(title) = self.selected_title().cloned() {
      self.open_detail(title);
    }
  }

  pub fn toggle_selected_favorite(&mut self) {
    let Some(title) = self.selected_title().cloned() else { return };
    if let Err(e) = self.favorites.toggle(&title) {
      warn!(err = %format!("{:#}", e), "failed to save favorites");
      self.set_error(format!("Failed to save favorites: {:#}", e));
    }
    self.clamp_liked_selection();
  }

  fn clamp_liked_selection(&mut self) {
    let len = self.favorites.set().len();
    if len == 0 {
      self.liked_state.select(None);
    } else {
      let sel = self.liked_state.selected().unwrap_or(0);
      self.liked_state.select(Some(sel.min(len - 1)));
    }
  }

  pub fn select_next(&mut self) {
    match (self.mode, self.tab) {
      (AppMode::Detail, _) => {
        if let Some(view) = &mut self.detail {
          step(&mut view.similar_state, view.similar.len(), true);
        }
      }
      (AppMode::Results, Tab::Discover) => {
        // No wrap here: Down on the last row is the request for more.
        let len = self.paginator.titles().len();
        if len > 0 {
          let at = self.results_state.selected().map_or(0, |i| (i + 1).min(len - 1));
          self.results_state.select(Some(at));
        }
        let at = self.results_state.selected().unwrap_or(0);
        if len == 0 || Self::is_near_end(at, len) {
          self.load_more();
        }
      }
      (AppMode::Results, Tab::Liked) => {
        let len = self.favorites.set().len();
        step(&mut self.liked_state, len, true);
      }
      (AppMode::Input, _) => {}
    }
  }

  pub fn select_prev(&mut self) {
    match (self.mode, self.tab) {
      (AppMode::Detail, _) => {
        if let Some(view) = &mut self.detail {
          step(&mut view.similar_state, view.similar.len(), false);
        }
      }
      (AppMode::Results, Tab::Discover) => {
        let len = self.paginator.titles().len();
        step(&mut self.results_state, len, false);
      }
      (AppMode::Results, Tab::Liked) => {
        let len = self.favorites.set().len();
        step(&mut self.liked_state, len, false);
      }
      (AppMode::Input, _) => {}
    }
  }

  /// Jump back to the first row.
  pub fn select_first(&mut self) {
    let state = match self.tab {
      Tab::Discover => &mut self.results_state,
      Tab::Liked => &mut self.liked_state,
    };
    if state.selected().is_some() {
      state.select(Some(0));
    }
  }

  // --- Async completion ---

  pub fn check_pending(&mut self) {
    if let Some((request, mut rx)) = self.tasks.page_rx.take() {
      let result = match rx.try_recv() {
        Ok(result) => Some(result),
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.page_rx = Some((request.clone(), rx));
          None
        }
        Err(oneshot::error::TryRecvError::Closed) => Some(Err(anyhow!("page fetch task ended without a result"))),
      };
      if let Some(result) = result {
        self.apply_page(&request, result);
      }
    }

    if let Some((generation, mut rx)) = self.tasks.detail_rx.take() {
      match rx.try_recv() {
        Ok(detail) => self.apply_detail(generation, detail),
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.detail_rx = Some((generation, rx));
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          if let Some(view) = &mut self.detail
            && view.generation == generation
          {
            view.loading = false;
          }
        }
      }
    }
  }

  fn apply_page(&mut self, request: &FetchRequest, result: PageResult) {
    let failure = result.as_ref().err().map(|e| format!("{:#}", e));
    match self.paginator.complete(request, result) {
      Applied::Appended { added } => {
        debug!(added, total = self.paginator.titles().len(), "page appended");
        self.status_message = None;
        let at = self.results_state.selected().unwrap_or(0);
        self.results_state.select(Some(at));
        // Still near the end after a short page: keep filling.
        if Self::is_near_end(at, self.paginator.titles().len()) {
          self.load_more();
        }
      }
      Applied::Exhausted => {
        self.status_message = None;
      }
      Applied::Failed => {
        self.status_message = None;
        let reason = failure.unwrap_or_else(|| "response did not match the request".to_string());
        self.set_error(format!("Failed to load movies: {}", reason));
      }
      Applied::Stale => {}
    }
  }

  fn apply_detail(&mut self, generation: u64, detail: TitleDetail) {
    let Some(view) = &mut self.detail else {
      debug!(title_id = detail.title_id, "detail arrived after close, dropped");
      return;
    };
    if view.generation != generation || view.title.id != detail.title_id {
      debug!(title_id = detail.title_id, generation, live = view.generation, "stale detail dropped");
      return;
    }
    view.loading = false;
    view.trailer_key = detail.trailer_key;
    view.similar = detail.similar;
    view.similar_state.select(if view.similar.is_empty() { None } else { Some(0) });
  }
}

/// Move a list selection one row, wrapping at both ends.
fn step(state: &mut ListState, len: usize, forward: bool) {
  if len == 0 {
    state.select(None);
    return;
  }
  let i = match (state.selected(), forward) {
    (None, _) => 0,
    (Some(i), true) => (i + 1) % len,
    (Some(0), false) => len - 1,
    (Some(i), false) => i.min(len) - 1,
  };
  state.select(Some(i));
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::prefs::SystemSignals;

  fn make_app() -> App {
    let catalog = CatalogClient::new("test_key".to_string(), "http://127.0.0.1:9".to_string());
    let signals = SystemSignals { prefers_dark: true, prefers_reduced_motion: false };
    App::new(catalog, FavoritesStore::load(None), PreferencesStore::load(None, signals))
  }

  fn title(id: u64) -> Title {
    Title { id, title: format!("Movie {id}"), poster_path: None, vote_average: 5.0, release_date: None, overview: None }
  }

  // --- step ---

  #[test]
  fn step_wraps_both_ways() {
    let mut s = ListState::default();
    step(&mut s, 3, true);
    assert_eq!(s.selected(), Some(0));
    step(&mut s, 3, false);
    assert_eq!(s.selected(), Some(2));
    step(&mut s, 3, true);
    assert_eq!(s.selected(), Some(0));
  }

  #[test]
  fn step_on_empty_list_clears_selection() {
    let mut s = ListState::default();
    s.select(Some(4));
    step(&mut s, 0, true);
    assert_eq!(s.selected(), None);
  }

  // --- is_near_end ---

  #[test]
  fn near_end_uses_threshold() {
    let threshold = constants().proximity_threshold;
    assert!(App::is_near_end(20 - threshold, 20));
    assert!(!App::is_near_end(20 - threshold - 1, 20));
    assert!(App::is_near_end(0, 0));
  }

  // --- prompt ---

  #[test]
  fn empty_prompt_is_a_usage_error() {
    let mut app = make_app();
    app.input = "   ".to_string();
    app.analyze_input();
    assert_eq!(app.last_error.as_deref(), Some("Please describe your mood first."));
    assert_eq!(app.mode, AppMode::Input);
    assert_eq!(app.paginator.mood(), None);
    assert!(app.tasks.page_rx.is_none());
  }

  #[tokio::test]
  async fn analyze_starts_session_for_classified_mood() {
    let mut app = make_app();
    app.input = "something calm and quiet".to_string();
    app.analyze_input();
    assert_eq!(app.paginator.mood(), Some(MoodLabel::Relaxed));
    assert_eq!(app.mode, AppMode::Results);
    let (request, _) = app.tasks.page_rx.as_ref().unwrap();
    assert!((1..=constants().random_start_pages).contains(&request.page));
  }

  #[tokio::test]
  async fn back_to_prompt_drops_in_flight_page() {
    let mut app = make_app();
    app.start_mood(MoodLabel::Sad);
    app.back_to_prompt();
    assert!(app.tasks.page_rx.is_none());
    assert_eq!(app.paginator.mood(), None);
    assert_eq!(app.mode, AppMode::Input);
  }

  // --- pages ---

  /// Start a happy session and feed its first page through the receiver.
  fn land_first_page(app: &mut App, start_page: u32, ids: std::ops::Range<u64>) {
    let request = app.paginator.advance(Signal::MoodSelected { mood: MoodLabel::Happy, start_page }).unwrap();
    let page = ResultPage { page: start_page, query: request.query.clone(), titles: ids.map(title).collect() };
    let (tx, rx) = oneshot::channel();
    tx.send(Ok(page)).unwrap();
    app.tasks.page_rx = Some((request, rx));
    app.mode = AppMode::Results;
    app.check_pending();
  }

  #[test]
  fn applied_page_selects_first_row() {
    let mut app = make_app();
    land_first_page(&mut app, 2, 1..21);
    assert_eq!(app.paginator.titles().len(), 20);
    assert_eq!(app.results_state.selected(), Some(0));
    assert!(app.tasks.page_rx.is_none());
  }

  #[tokio::test]
  async fn short_page_keeps_filling() {
    let mut app = make_app();
    land_first_page(&mut app, 2, 1..3);
    assert_eq!(app.results_state.selected(), Some(0));
    let (request, _) = app.tasks.page_rx.as_ref().unwrap();
    assert_eq!(request.page, 3);
  }

  #[tokio::test]
  async fn down_on_last_row_retries_failed_page() {
    let mut app = make_app();
    land_first_page(&mut app, 1, 1..21);

    let request = app.paginator.advance(Signal::Proximity).unwrap();
    assert_eq!(request.page, 2);
    let (tx, rx) = oneshot::channel();
    tx.send(Err(anyhow!("timed out"))).unwrap();
    app.tasks.page_rx = Some((request, rx));
    app.check_pending();
    assert!(app.tasks.page_rx.is_none());

    app.results_state.select(Some(19));
    app.select_next();
    assert_eq!(app.results_state.selected(), Some(19));
    let (retry, _) = app.tasks.page_rx.as_ref().unwrap();
    assert_eq!(retry.page, 2);
  }

  #[test]
  fn failed_page_surfaces_error() {
    let mut app = make_app();
    let request = app.paginator.advance(Signal::MoodSelected { mood: MoodLabel::Happy, start_page: 1 }).unwrap();
    let (tx, rx) = oneshot::channel();
    tx.send(Err(anyhow!("connection refused"))).unwrap();
    app.tasks.page_rx = Some((request, rx));
    app.check_pending();
    assert!(app.last_error.as_deref().unwrap().contains("connection refused"));
    assert!(!app.paginator.is_loading());
  }

  // --- detail ---

  #[tokio::test]
  async fn stale_detail_is_discarded() {
    let mut app = make_app();
    app.open_detail(title(1));
    app.open_detail(title(2));
    let live = app.detail.as_ref().unwrap().generation;

    // An answer for the first title arrives late.
    let (tx, rx) = oneshot::channel();
    tx.send(TitleDetail { title_id: 1, trailer_key: Some("old".to_string()), similar: vec![title(9)] }).unwrap();
    app.tasks.detail_rx = Some((live - 1, rx));
    app.check_pending();

    let view = app.detail.as_ref().unwrap();
    assert_eq!(view.title.id, 2);
    assert_eq!(view.trailer_key, None);
    assert!(view.loading);
  }

  #[tokio::test]
  async fn live_detail_is_applied_and_close_restores_mode() {
    let mut app = make_app();
    app.tab = Tab::Liked;
    app.mode = AppMode::Results;
    app.open_detail(title(5));
    let live = app.detail.as_ref().unwrap().generation;

    let (tx, rx) = oneshot::channel();
    tx.send(TitleDetail { title_id: 5, trailer_key: Some("abc".to_string()), similar: vec![title(6), title(7)] })
      .unwrap();
    app.tasks.detail_rx = Some((live, rx));
    app.check_pending();

    assert_eq!(app.trailer_url().as_deref(), Some("https://www.youtube.com/watch?v=abc"));
    assert_eq!(app.detail.as_ref().unwrap().similar_state.selected(), Some(0));

    app.open_selected_similar();
    assert_eq!(app.detail.as_ref().unwrap().title.id, 6);
    app.close_detail();
    assert_eq!(app.mode, AppMode::Results);
    assert!(app.detail.is_none());
  }

  // --- favorites & tabs ---

  #[test]
  fn toggling_from_liked_tab_keeps_selection_in_range() {
    let mut app = make_app();
    app.favorites.toggle(&title(1)).unwrap();
    app.favorites.toggle(&title(2)).unwrap();
    app.switch_tab();
    assert_eq!(app.tab, Tab::Liked);
    app.select_next();
    assert_eq!(app.liked_state.selected(), Some(1));
    app.toggle_selected_favorite();
    assert_eq!(app.favorites.set().len(), 1);
    assert_eq!(app.liked_state.selected(), Some(0));
  }

  #[test]
  fn switching_back_without_mood_returns_to_prompt() {
    let mut app = make_app();
    app.switch_tab();
    app.switch_tab();
    assert_eq!(app.tab, Tab::Discover);
    assert_eq!(app.mode, AppMode::Input);
  }

  #[test]
  fn reduced_motion_freezes_spinner() {
    let mut app = make_app();
    app.toggle_reduced_motion();
    assert_eq!(app.spinner(), "…");
  }
}
