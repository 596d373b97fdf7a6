//! TUI rendering. Orchestrates all panes.

pub mod subject_editor;
pub mod subject_list;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};
use syllabus_core::{coordinator::Phase, store::SubjectStore};

use crate::app::{App, Focus, Screen};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw<S: SubjectStore + 'static>(f: &mut Frame, app: &App<S>) {
  let area = f.area();

  // Vertical stack: header, body, status bar.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  match app.screen {
    Screen::SubjectList => subject_list::draw(f, rows[1], app),
    Screen::EditSubject => subject_editor::draw(f, rows[1], app),
  }
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header<S: SubjectStore + 'static>(f: &mut Frame, area: Rect, app: &App<S>) {
  let date = Local::now().format("%Y-%m-%d").to_string();

  let title = match app.editor.as_ref().and_then(|e| e.subject()) {
    Some(subject) if app.screen == Screen::EditSubject => {
      format!(" syllabus › {}", subject.title)
    }
    _ => " syllabus".to_string(),
  };
  let left = Span::styled(
    title,
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(
    format!("{date} "),
    Style::default().fg(Color::DarkGray),
  );

  // Simple left-right header: pad the middle.
  let left_width = left.width() as u16;
  let right_width = right.width() as u16;
  let pad = area
    .width
    .saturating_sub(left_width)
    .saturating_sub(right_width);

  let line = Line::from(vec![
    left,
    Span::raw(" ".repeat(pad as usize)),
    right,
  ]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status<S: SubjectStore + 'static>(f: &mut Frame, area: Rect, app: &App<S>) {
  let editor = app.editor.as_ref().filter(|_| app.screen == Screen::EditSubject);

  let (mode_label, hints) = match (app.screen, editor) {
    (Screen::SubjectList, _) if app.filter_active => (
      "SEARCH",
      "Type to filter  Esc cancel  Enter select",
    ),
    (Screen::SubjectList, _) => (
      "LIST",
      "↑↓/jk navigate  / search  Enter edit  r refresh  q quit",
    ),
    (Screen::EditSubject, Some(e)) if e.prompt.is_some() => (
      "NEW",
      "Type a title  Enter create  Esc cancel",
    ),
    (Screen::EditSubject, Some(e)) => match e.focus {
      Focus::Title | Focus::Description => (
        "EDIT",
        "Type to edit  Tab/Shift-Tab save & move  Ctrl-R revert  Esc save & back",
      ),
      Focus::Published => ("EDIT", "Space toggle  Tab move  Esc back"),
      Focus::Users => ("EDIT", "↑↓ select  Space assign/unassign  Tab move  Esc back"),
      Focus::Content => ("EDIT", "↑↓ scroll  t new topic  z new quiz  Tab move  Esc back"),
    },
    (Screen::EditSubject, None) => ("EDIT", ""),
  };

  let activity = editor.map(|e| e.status()).and_then(|s| match s.phase {
    Phase::Mutating => Some("saving…"),
    Phase::Refetching => Some("refreshing…"),
    Phase::Idle if s.fetch_in_flight => Some("loading…"),
    Phase::Idle => None,
  });

  let status = match (&app.last_error, activity) {
    (_, Some(activity)) => activity.to_string(),
    (Some(err), None) => format!("{}: {}", err.kind, err.message),
    (None, None) if !app.status_msg.is_empty() => app.status_msg.clone(),
    (None, None) => hints.to_string(),
  };
  let status_style = if app.last_error.is_some() && activity.is_none() {
    Style::default().fg(Color::Red)
  } else {
    Style::default().fg(Color::DarkGray)
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let mut spans = vec![mode_span, Span::styled(format!("  {status}"), status_style)];
  if app.pending() > 1 {
    spans.push(Span::styled(
      format!("  ({} queued)", app.pending()),
      Style::default().fg(Color::Yellow),
    ));
  }

  f.render_widget(
    Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black)),
    area,
  );
}
