//! Subject list screen.

use ratatui::{
  Frame,
  layout::{Constraint, Rect},
  style::{Color, Modifier, Style},
  text::Span,
  widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};
use syllabus_core::store::SubjectStore;

use crate::app::App;

/// Render the subject table into `area`.
pub fn draw<S: SubjectStore + 'static>(f: &mut Frame, area: Rect, app: &App<S>) {
  let filtered = app.filtered_subjects();
  let total = app.subjects.len();

  // Title with count.
  let title = if app.filter_active || !app.filter.is_empty() {
    format!(" Subjects ({}/{}) ", filtered.len(), total)
  } else {
    format!(" Subjects ({}) ", total)
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let mut inner_area = block.inner(area);
  f.render_widget(block, area);

  // Filter bar at the bottom of the inner area.
  if (app.filter_active || !app.filter.is_empty()) && inner_area.height > 2 {
    let filter_area = Rect {
      x:      inner_area.x,
      y:      inner_area.y + inner_area.height - 1,
      width:  inner_area.width,
      height: 1,
    };
    inner_area.height = inner_area.height.saturating_sub(1);

    let filter_text = if app.filter_active {
      format!("/{}_", app.filter)
    } else {
      format!("/{}", app.filter)
    };
    f.render_widget(
      Paragraph::new(filter_text).style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  let rows = filtered.iter().map(|s| {
    let published = if s.is_published {
      Span::styled("published", Style::default().fg(Color::Green))
    } else {
      Span::styled("draft", Style::default().fg(Color::DarkGray))
    };
    Row::new(vec![
      Cell::from(s.title.clone()),
      Cell::from(s.subject_type.to_string()),
      Cell::from(published),
      Cell::from(s.users_assigned.to_string()),
      Cell::from(s.last_updated_at.format("%Y-%m-%d %H:%M").to_string()),
    ])
  });

  let header = Row::new(["Title", "Type", "State", "Users", "Updated"])
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

  let mut state = TableState::default();
  state.select(if filtered.is_empty() { None } else { Some(app.list_cursor) });

  f.render_stateful_widget(
    Table::new(rows, [
      Constraint::Min(20),
      Constraint::Length(9),
      Constraint::Length(10),
      Constraint::Length(6),
      Constraint::Length(17),
    ])
    .header(header)
    .row_highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner_area,
    &mut state,
  );
}
