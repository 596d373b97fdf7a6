//! Edit Subject screen.

use chrono::{DateTime, Local, Utc};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use syllabus_core::{
  content::ContentKind,
  store::SubjectStore,
  subject::{Subject, SubjectField},
  user::User,
};

use crate::app::{App, Editor, Focus};

/// Render the editor into `area`.
pub fn draw<S: SubjectStore + 'static>(f: &mut Frame, area: Rect, app: &App<S>) {
  let Some(editor) = app.editor.as_ref() else {
    return;
  };
  let subject = editor.subject();

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(4), // audit
      Constraint::Length(3), // title
      Constraint::Length(5), // description
      Constraint::Length(3), // published
      Constraint::Min(0),    // users + content
    ])
    .split(area);

  draw_audit(f, rows[0], subject.as_deref());
  draw_field(f, rows[1], editor, SubjectField::Title, subject.as_deref());
  draw_field(f, rows[2], editor, SubjectField::Description, subject.as_deref());
  draw_published(f, rows[3], editor, subject.as_deref());

  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
    .split(rows[4]);
  draw_users(f, cols[0], editor, &app.users, subject.as_deref());
  draw_content(f, cols[1], editor);
}

fn region(title: &str, focused: bool) -> Block<'static> {
  let border = if focused {
    Style::default().fg(Color::Cyan)
  } else {
    Style::default().fg(Color::DarkGray)
  };
  Block::default()
    .title(format!(" {title} "))
    .borders(Borders::ALL)
    .border_style(border)
}

fn local(dt: DateTime<Utc>) -> String {
  dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn author(user: Option<&User>) -> &str { user.map_or("unknown", |u| u.full_name.as_str()) }

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_audit(f: &mut Frame, area: Rect, subject: Option<&Subject>) {
  let block = region("Subject", false);
  let inner = block.inner(area);
  f.render_widget(block, area);

  let Some(s) = subject else {
    f.render_widget(
      Paragraph::new("Loading…").style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  };

  let label = Style::default().fg(Color::DarkGray);
  let rate = s
    .completion_rate
    .map_or_else(|| "n/a".to_string(), |r| format!("{:.0}%", r * 100.0));
  let lines = vec![
    Line::from(vec![
      Span::styled("Type ", label),
      Span::styled(s.subject_type.to_string(), Style::default().add_modifier(Modifier::BOLD)),
      Span::styled("   Completion ", label),
      Span::raw(rate),
    ]),
    Line::from(vec![
      Span::styled("Created ", label),
      Span::raw(format!("{} by {}", local(s.created_at), author(s.created_by.as_ref()))),
      Span::styled("   Updated ", label),
      Span::raw(format!(
        "{} by {}",
        local(s.last_updated_at),
        author(s.last_updated_by.as_ref())
      )),
    ]),
  ];
  f.render_widget(Paragraph::new(lines), inner);
}

// ─── Fields ───────────────────────────────────────────────────────────────────

fn draw_field<S: SubjectStore + 'static>(
  f: &mut Frame,
  area: Rect,
  editor: &Editor<S>,
  field: SubjectField,
  subject: Option<&Subject>,
) {
  let autosave = editor.autosave(field);
  let focused = editor.focus.field() == Some(field);
  let name = match field {
    SubjectField::Title => "Title",
    SubjectField::Description => "Description",
  };
  let title = if autosave.is_dirty() { format!("{name} *") } else { name.to_string() };

  let mut text = autosave.display(subject);
  if focused {
    text.push('_');
  }
  f.render_widget(
    Paragraph::new(text)
      .wrap(Wrap { trim: false })
      .block(region(&title, focused)),
    area,
  );
}

fn draw_published<S: SubjectStore + 'static>(
  f: &mut Frame,
  area: Rect,
  editor: &Editor<S>,
  subject: Option<&Subject>,
) {
  let published = subject.is_some_and(|s| s.is_published);
  let mark = if published { "[x] published" } else { "[ ] draft" };
  f.render_widget(
    Paragraph::new(mark).block(region("Published", editor.focus == Focus::Published)),
    area,
  );
}

// ─── Users ────────────────────────────────────────────────────────────────────

fn draw_users<S: SubjectStore + 'static>(
  f: &mut Frame,
  area: Rect,
  editor: &Editor<S>,
  users: &[User],
  subject: Option<&Subject>,
) {
  let focused = editor.focus == Focus::Users;
  let assigned = subject.map_or(0, |s| s.users_assigned.len());
  let block = region(&format!("Users ({assigned} assigned)"), focused);

  let items: Vec<ListItem> = users
    .iter()
    .map(|u| {
      let is_assigned = subject.is_some_and(|s| s.is_assigned(u.user_id));
      let mark = if is_assigned { "[x] " } else { "[ ] " };
      ListItem::new(Line::from(vec![
        Span::raw(mark),
        Span::raw(u.full_name.clone()),
        Span::styled(format!("  {}", u.email), Style::default().fg(Color::DarkGray)),
      ]))
    })
    .collect();

  let mut state = ListState::default();
  if focused && !users.is_empty() {
    state.select(Some(editor.user_cursor));
  }
  f.render_stateful_widget(
    List::new(items)
      .block(block)
      .highlight_style(Style::default().bg(Color::Blue).fg(Color::White)),
    area,
    &mut state,
  );
}

// ─── Content ──────────────────────────────────────────────────────────────────

fn draw_content<S: SubjectStore + 'static>(f: &mut Frame, area: Rect, editor: &Editor<S>) {
  let focused = editor.focus == Focus::Content;
  let content = editor.coordinator.content();
  let block = region(&format!("Content ({})", content.len()), focused);
  let mut inner = block.inner(area);
  f.render_widget(block, area);

  if let Some(prompt) = &editor.prompt
    && inner.height > 1
  {
    let kind = match prompt.kind {
      ContentKind::Topic => "New topic",
      ContentKind::Quiz => "New quiz",
    };
    let prompt_area = Rect { y: inner.y + inner.height - 1, height: 1, ..inner };
    inner.height -= 1;
    f.render_widget(
      Paragraph::new(format!("{kind}: {}_", prompt.title)).style(Style::default().fg(Color::Yellow)),
      prompt_area,
    );
  }

  let items: Vec<ListItem> = content
    .iter()
    .map(|entry| {
      let (marker, color) = match entry.kind() {
        ContentKind::Topic => ("T", Color::Cyan),
        ContentKind::Quiz => ("Q", Color::Magenta),
      };
      ListItem::new(Line::from(vec![
        Span::styled(format!("{marker} "), Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(format!("{:>3} ", entry.position()), Style::default().fg(Color::DarkGray)),
        Span::raw(entry.title().to_string()),
      ]))
    })
    .collect();

  let mut state = ListState::default();
  if focused && !content.is_empty() {
    state.select(Some(editor.content_cursor));
  }
  f.render_stateful_widget(
    List::new(items).highlight_style(Style::default().bg(Color::Blue).fg(Color::White)),
    inner,
    &mut state,
  );
}
