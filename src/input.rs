use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, AppMode, Tab};
use crate::mood::MoodLabel;

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

/// Mood chip bound to a function key (F1..F4 in declaration order).
fn chip_for(code: KeyCode) -> Option<MoodLabel> {
  match code {
    KeyCode::F(n @ 1..=4) => MoodLabel::ALL.get(usize::from(n) - 1).copied(),
    _ => None,
  }
}

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: event::KeyEvent) {
  let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

  if ctrl && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return;
  }

  if ctrl && key.code == KeyCode::Char('t') {
    app.toggle_theme();
    return;
  }

  // Ctrl+A: reduced motion
  if ctrl && key.code == KeyCode::Char('a') {
    app.toggle_reduced_motion();
    return;
  }

  if key.code == KeyCode::Tab {
    app.switch_tab();
    return;
  }

  match app.mode {
    AppMode::Input => handle_input_key(app, key),
    AppMode::Results => handle_results_key(app, key),
    AppMode::Detail => handle_detail_key(app, key),
  }
}

fn handle_input_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();

  if let Some(mood) = chip_for(key.code) {
    app.start_mood(mood);
    return;
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
    app.surprise();
    return;
  }

  match key.code {
    KeyCode::Enter => {
      app.analyze_input();
    }
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
      app.input.insert(byte_idx, c);
      app.cursor_position += 1;
    }
    KeyCode::Backspace => {
      if app.cursor_position > 0 {
        app.cursor_position -= 1;
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Delete => {
      if app.cursor_position < app.input.chars().count() {
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < app.input.chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.input.chars().count();
    }
    KeyCode::Esc => {
      if !app.input.is_empty() {
        app.input.clear();
        app.cursor_position = 0;
        app.input_scroll = 0;
      } else {
        app.should_quit = true;
      }
    }
    _ => {}
  }
}

fn handle_results_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => {
      app.open_selected();
    }
    KeyCode::Char(' ') | KeyCode::Char('l') => {
      app.toggle_selected_favorite();
    }
    KeyCode::Down | KeyCode::Char('j') => {
      app.select_next();
    }
    KeyCode::Up | KeyCode::Char('k') => {
      app.select_prev();
    }
    KeyCode::Home | KeyCode::Char('g') => {
      app.select_first();
    }
    KeyCode::Char('r') if app.tab == Tab::Discover => {
      // Explicit retry after a failed page; same rules as scrolling near the end.
      app.load_more();
    }
    KeyCode::Char('s') if app.tab == Tab::Discover => {
      app.surprise();
    }
    KeyCode::Esc | KeyCode::Backspace => match app.tab {
      Tab::Discover => app.back_to_prompt(),
      Tab::Liked => app.switch_tab(),
    },
    _ => {}
  }
}

fn handle_detail_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Esc | KeyCode::Backspace => {
      app.close_detail();
    }
    KeyCode::Down | KeyCode::Char('j') => {
      app.select_next();
    }
    KeyCode::Up | KeyCode::Char('k') => {
      app.select_prev();
    }
    KeyCode::Enter => {
      app.open_selected_similar();
    }
    KeyCode::Char(' ') | KeyCode::Char('l') => {
      app.toggle_selected_favorite();
    }
    KeyCode::Char('o') => {
      app.open_trailer();
    }
    _ => {}
  }
}
