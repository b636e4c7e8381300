use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, List, ListItem, ListState, Padding, Paragraph, Wrap},
};

use crate::app::{App, AppMode, DetailView, Tab};
use crate::favorites::FavoritesStore;
use crate::mood::MoodLabel;
use crate::query::to_query;
use crate::theme::Theme;
use crate::tmdb::Title;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

/// `Title (1999)` or just `Title`.
fn title_with_year(title: &Title) -> String {
  match title.release_year() {
    Some(year) => format!("{} ({})", title.title, year),
    None => title.title.clone(),
  }
}

fn rounded<'a>(theme: &Theme, focused: bool) -> Block<'a> {
  Block::bordered()
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(if focused { theme.accent } else { theme.border }))
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, app, header_area);
  render_main(frame, app, main_area);
  render_status(frame, app, status_area);
  render_input(frame, app, input_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let tab_style = |tab: Tab| {
    if app.tab == tab {
      Style::default().fg(theme.accent).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
      Style::default().fg(theme.muted)
    }
  };
  let left = Line::from(vec![
    Span::styled(" ◉ moodflix ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
    Span::raw("  "),
    Span::styled("Discover", tab_style(Tab::Discover)),
    Span::styled("  ·  ", Style::default().fg(theme.border)),
    Span::styled(format!("Liked ({})", app.favorites.set().len()), tab_style(Tab::Liked)),
  ]);
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let width = (version.len() as u16).min(area.width);
  let right_area = Rect { x: area.x + area.width - width, width, ..area };
  frame.render_widget(right, right_area);
}

fn render_main(frame: &mut Frame, app: &mut App, area: Rect) {
  if app.mode == AppMode::Detail {
    render_detail(frame, app, area);
    return;
  }
  match app.tab {
    Tab::Liked => render_liked(frame, app, area),
    Tab::Discover if app.paginator.mood().is_some() => render_results(frame, app, area),
    Tab::Discover => render_welcome(frame, app.theme(), area),
  }
}

fn render_welcome(frame: &mut Frame, theme: &Theme, area: Rect) {
  let mut chips = vec![Span::styled("Or pick one:  ", Style::default().fg(theme.muted))];
  for (i, mood) in MoodLabel::ALL.iter().enumerate() {
    chips.push(Span::styled(format!(" F{} ", i + 1), Style::default().fg(theme.key_fg).bg(theme.key_bg)));
    chips.push(Span::styled(format!(" {}   ", mood), Style::default().fg(theme.secondary)));
  }

  let text = vec![
    Line::from(""),
    Line::from(Span::styled("What's your mood today?", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(Span::styled("Describe how you feel below and press Enter.", Style::default().fg(theme.fg))),
    Line::from(""),
    Line::from(chips),
    Line::from(""),
    Line::from(Span::styled("Feeling lucky? ^s picks a mood for you.", Style::default().fg(theme.muted))),
  ];
  let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(rounded(theme, false));
  frame.render_widget(paragraph, area);
}

/// One list row: heart, rating, title and year.
fn title_item<'a>(
  title: &Title,
  favorites: &FavoritesStore,
  theme: &Theme,
  stripe: bool,
  inner_w: usize,
) -> ListItem<'a> {
  let liked = favorites.contains(title.id);
  let heart = if liked { "♥ " } else { "♡ " };
  let rating = format!("★ {:.1}  ", title.vote_average);
  let name_w = inner_w.saturating_sub(heart.chars().count() + rating.chars().count());
  let line = Line::from(vec![
    Span::styled(heart, Style::default().fg(if liked { theme.liked } else { theme.muted })),
    Span::styled(rating, Style::default().fg(theme.muted)),
    Span::styled(truncate_str(&title_with_year(title), name_w), Style::default().fg(theme.fg)),
  ]);
  ListItem::new(line).bg(if stripe { theme.stripe_bg } else { theme.bg })
}

fn render_title_list(
  frame: &mut Frame,
  theme: &Theme,
  area: Rect,
  items: Vec<ListItem>,
  title: String,
  state: &mut ListState,
) {
  let list = List::new(items)
    .block(
      rounded(theme, true)
        .title(title)
        .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
    )
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));
  frame.render_stateful_widget(list, area, state);
}

fn render_results(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;

  let mut items: Vec<ListItem> = app
    .paginator
    .titles()
    .iter()
    .enumerate()
    .map(|(i, t)| title_item(t, &app.favorites, theme, i % 2 == 1, inner_w))
    .collect();
  if app.paginator.is_exhausted() {
    let marker = if items.is_empty() { "No movies found for this mood." } else { "— end of results —" };
    items.push(ListItem::new(Line::from(Span::styled(marker, Style::default().fg(theme.muted)))));
  }

  let mood = app.paginator.mood().unwrap_or(MoodLabel::ALL[0]);
  let state = app.paginator.state();
  let suffix = if app.paginator.is_loading() { format!(" {} loading", app.spinner()) } else { String::new() };
  let title =
    format!(" {} · {} · {} movies · p{}{} ", mood, to_query(mood), state.titles.len(), state.current_page, suffix);
  render_title_list(frame, theme, area, items, title, &mut app.results_state);
}

fn render_liked(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let inner_w = area.width.saturating_sub(4) as usize;
  if app.favorites.set().is_empty() {
    let text = vec![
      Line::from(""),
      Line::from(Span::styled("Nothing liked yet.", Style::default().fg(theme.fg))),
      Line::from(""),
      Line::from(Span::styled("Press Space on a movie to keep it here.", Style::default().fg(theme.muted))),
    ];
    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(rounded(theme, true).title(" Liked "));
    frame.render_widget(paragraph, area);
    return;
  }

  let titles = app.favorites.set().titles();
  let items: Vec<ListItem> =
    titles.iter().enumerate().map(|(i, t)| title_item(t, &app.favorites, theme, i % 2 == 1, inner_w)).collect();
  let title = format!(" Liked — {} ", titles.len());
  render_title_list(frame, theme, area, items, title, &mut app.liked_state);
}

fn detail_lines<'a>(view: &DetailView, app: &App, theme: &Theme, inner_w: usize) -> Vec<Line<'a>> {
  let t = &view.title;
  let liked = app.favorites.contains(t.id);
  let mut meta = vec![Span::styled(format!("★ {:.1}", t.vote_average), Style::default().fg(theme.fg))];
  if let Some(year) = t.release_year() {
    meta.push(Span::styled(format!("  ·  {}", year), Style::default().fg(theme.muted)));
  }
  if liked {
    meta.push(Span::styled("  ·  ♥ liked", Style::default().fg(theme.liked)));
  }

  let mut lines = vec![Line::from(""), Line::from(meta), Line::from("")];
  lines.push(Line::from(Span::styled(
    t.overview.clone().filter(|o| !o.is_empty()).unwrap_or_else(|| "No synopsis available.".to_string()),
    Style::default().fg(theme.fg),
  )));
  lines.push(Line::from(""));

  let trailer = match (&view.trailer_key, app.trailer_url(), view.loading) {
    (Some(_), Some(url), _) => Span::styled(
      truncate_str(&url, inner_w.saturating_sub(9)),
      Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
    ),
    (_, _, true) => Span::styled(format!("{} looking…", app.spinner()), Style::default().fg(theme.muted)),
    _ => Span::styled("none", Style::default().fg(theme.muted)),
  };
  lines.push(Line::from(vec![Span::styled("Trailer  ", Style::default().fg(theme.muted)), trailer]));
  if let Some(poster) = t.poster_url() {
    lines.push(Line::from(vec![
      Span::styled("Poster   ", Style::default().fg(theme.muted)),
      Span::styled(truncate_str(&poster, inner_w.saturating_sub(9)), Style::default().fg(theme.muted)),
    ]));
  }
  lines
}

fn render_detail(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let Some(view) = app.detail.as_ref() else { return };

  let [info_area, similar_area] = Layout::vertical([Constraint::Min(8), Constraint::Length(8)]).areas(area);
  let inner_w = info_area.width.saturating_sub(4) as usize;

  let block = rounded(theme, false)
    .title(format!(" {} ", truncate_str(&title_with_year(&view.title), inner_w)))
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .padding(Padding::horizontal(1));
  let paragraph =
    Paragraph::new(detail_lines(view, app, theme, inner_w)).wrap(Wrap { trim: true }).block(block);
  frame.render_widget(paragraph, info_area);

  let similar_w = similar_area.width.saturating_sub(4) as usize;
  let items: Vec<ListItem> = view
    .similar
    .iter()
    .enumerate()
    .map(|(i, t)| title_item(t, &app.favorites, theme, i % 2 == 1, similar_w))
    .collect();
  let title = if view.loading { format!(" Similar movies {} ", app.spinner()) } else { " Similar movies ".to_string() };

  if let Some(view) = app.detail.as_mut() {
    render_title_list(frame, theme, similar_area, items, title, &mut view.similar_state);
  }
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" {} {}", app.spinner(), msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(mood) = app.paginator.mood() {
    (format!(" Mood: {}", mood), Style::default().fg(theme.muted))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let focused = app.mode == AppMode::Input;
  let border_color = if focused { theme.accent } else { theme.border };
  let input_block = Block::bordered()
    .title(" Describe how you feel ")
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = (area.width.saturating_sub(4) as usize).max(1);
  let cursor_col = display_width(&app.input, app.cursor_position);

  if cursor_col < app.input_scroll {
    app.input_scroll = cursor_col;
  } else if cursor_col >= app.input_scroll + inner_w {
    app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = app
    .input
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.input_scroll)
    .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  if focused {
    let cursor_x = area.x + 2 + cursor_col.saturating_sub(app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn footer_keys(app: &App) -> Vec<(&'static str, &'static str)> {
  match app.mode {
    AppMode::Input => {
      vec![("Enter", "Analyze"), ("F1-F4", "Mood"), ("^s", "Surprise"), ("Tab", "Liked"), ("Esc", "Quit")]
    }
    AppMode::Results => {
      let mut k = vec![("Enter", "Details"), ("Space", "Like"), ("j/k", "Navigate"), ("g", "Top")];
      match app.tab {
        Tab::Discover => {
          k.push(("s", "Surprise"));
          k.push(("Esc", "Back"));
        }
        Tab::Liked => k.push(("Esc", "Discover")),
      }
      k
    }
    AppMode::Detail => vec![("o", "Trailer"), ("Space", "Like"), ("Enter", "Open similar"), ("Esc", "Close")],
  }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let mut keys = footer_keys(app);
  keys.push(("^t", "Theme"));
  keys.push(("^a", "Motion"));

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let motion = if app.prefs.get().reduced_motion { " · still" } else { "" };
  let theme_label = format!("{}{} ", theme.name, motion);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let width = (theme_label.len() as u16).min(area.width);
  let right_area = Rect { x: area.x + area.width - width, width, ..area };
  frame.render_widget(right, right_area);
}
