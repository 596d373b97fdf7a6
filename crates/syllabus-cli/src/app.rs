//! Application state machine and event dispatcher.

use std::{future::Future, sync::Arc};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use syllabus_core::{
  OperationError, Result,
  autosave::AutosaveField,
  content::ContentKind,
  coordinator::{Status, SubjectCoordinator},
  store::SubjectStore,
  subject::{Subject, SubjectField, SubjectSummary},
  user::User,
};
use tokio::sync::mpsc;
use uuid::Uuid;

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  /// Browse and filter subjects.
  SubjectList,
  /// Edit one subject through its coordinator.
  EditSubject,
}

/// Focusable regions of the Edit Subject screen, in Tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
  Title,
  Description,
  Published,
  Users,
  Content,
}

impl Focus {
  const ORDER: [Focus; 5] = [
    Focus::Title,
    Focus::Description,
    Focus::Published,
    Focus::Users,
    Focus::Content,
  ];

  fn index(self) -> usize { Self::ORDER.iter().position(|f| *f == self).unwrap_or(0) }

  pub fn next(self) -> Self { Self::ORDER[(self.index() + 1) % Self::ORDER.len()] }

  pub fn prev(self) -> Self {
    Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
  }

  /// The autosaved text field this region edits, if any.
  pub fn field(self) -> Option<SubjectField> {
    match self {
      Focus::Title => Some(SubjectField::Title),
      Focus::Description => Some(SubjectField::Description),
      _ => None,
    }
  }
}

/// A new topic or quiz whose title is being typed.
#[derive(Debug, Clone)]
pub struct Prompt {
  pub kind:  ContentKind,
  pub title: String,
}

// ─── Background operations ───────────────────────────────────────────────────

/// Result of a spawned coordinator operation.
struct Outcome {
  op:     &'static str,
  result: Result<()>,
}

/// Coordinator calls run as tasks so the UI keeps drawing while they are in
/// flight; their results come back over a channel.
struct Tasks {
  tx:      mpsc::UnboundedSender<Outcome>,
  rx:      mpsc::UnboundedReceiver<Outcome>,
  pending: usize,
}

impl Tasks {
  fn new() -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self { tx, rx, pending: 0 }
  }

  fn spawn<F>(&mut self, op: &'static str, fut: F)
  where
    F: Future<Output = Result<()>> + Send + 'static,
  {
    let tx = self.tx.clone();
    self.pending += 1;
    tracing::debug!(op, "operation started");
    tokio::spawn(async move {
      let result = fut.await;
      tx.send(Outcome { op, result }).ok();
    });
  }
}

// ─── Editor ───────────────────────────────────────────────────────────────────

/// State of the Edit Subject screen.
pub struct Editor<S> {
  pub coordinator:    Arc<SubjectCoordinator<S>>,
  pub title:          Arc<AutosaveField>,
  pub description:    Arc<AutosaveField>,
  pub focus:          Focus,
  pub user_cursor:    usize,
  pub content_cursor: usize,
  pub prompt:         Option<Prompt>,
}

impl<S: SubjectStore + 'static> Editor<S> {
  fn new(store: Arc<S>, subject_id: Uuid) -> Self {
    Self {
      coordinator:    Arc::new(SubjectCoordinator::new(store, subject_id)),
      title:          Arc::new(AutosaveField::new(SubjectField::Title)),
      description:    Arc::new(AutosaveField::new(SubjectField::Description)),
      focus:          Focus::Title,
      user_cursor:    0,
      content_cursor: 0,
      prompt:         None,
    }
  }

  pub fn subject(&self) -> Option<Arc<Subject>> { self.coordinator.subject() }

  pub fn status(&self) -> Status { self.coordinator.status() }

  pub fn autosave(&self, field: SubjectField) -> &Arc<AutosaveField> {
    match field {
      SubjectField::Title => &self.title,
      SubjectField::Description => &self.description,
    }
  }

  /// Commit the focused text field in the background, if it has an overlay.
  fn commit_focused(&self, tasks: &mut Tasks) {
    let Some(field) = self.focus.field() else {
      return;
    };
    let autosave = self.autosave(field).clone();
    if !autosave.is_dirty() {
      return;
    }
    let coordinator = self.coordinator.clone();
    let op = match field {
      SubjectField::Title => "save title",
      SubjectField::Description => "save description",
    };
    tasks.spawn(op, async move { autosave.commit(&coordinator).await });
  }
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App<S> {
  /// Current screen / keyboard focus.
  pub screen: Screen,

  /// Subject rows returned by the API.
  pub subjects: Vec<SubjectSummary>,

  /// Every known user, for the assignment list.
  pub users: Vec<User>,

  /// Current fuzzy-filter string (only active when `filter_active`).
  pub filter: String,

  /// Whether the user is typing a filter query.
  pub filter_active: bool,

  /// Cursor position within the *filtered* subject list.
  pub list_cursor: usize,

  /// The open editor, while on [`Screen::EditSubject`].
  pub editor: Option<Editor<S>>,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  /// The most recent failed operation.
  pub last_error: Option<OperationError>,

  store: Arc<S>,
  tasks: Tasks,
}

impl<S: SubjectStore + 'static> App<S> {
  /// Create an [`App`] with an empty subject list.
  pub fn new(store: Arc<S>) -> Self {
    Self {
      screen: Screen::SubjectList,
      subjects: Vec::new(),
      users: Vec::new(),
      filter: String::new(),
      filter_active: false,
      list_cursor: 0,
      editor: None,
      status_msg: String::new(),
      last_error: None,
      store,
      tasks: Tasks::new(),
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Fetch all subjects and users from the store.
  pub async fn load_subjects(&mut self) -> Result<()> {
    self.status_msg = "Loading subjects…".into();
    let loaded = async {
      let subjects = self.store.list_subjects().await.map_err(Into::<OperationError>::into)?;
      let users = self.store.list_users().await.map_err(Into::<OperationError>::into)?;
      Ok::<_, OperationError>((subjects, users))
    }
    .await;

    match loaded {
      Ok((subjects, users)) => {
        self.subjects = subjects;
        self.users = users;
        self.list_cursor = self.list_cursor.min(self.subjects.len().saturating_sub(1));
        self.status_msg.clear();
        Ok(())
      }
      Err(e) => {
        self.status_msg = format!("Error: {e}");
        self.last_error = Some(e.clone());
        Err(e)
      }
    }
  }

  /// Collect results of finished background operations.
  pub fn drain_outcomes(&mut self) {
    while let Ok(outcome) = self.tasks.rx.try_recv() {
      self.record(outcome);
    }
  }

  /// Wait until every spawned operation has reported back.
  #[cfg(test)]
  pub async fn settle(&mut self) {
    while self.tasks.pending > 0 {
      match self.tasks.rx.recv().await {
        Some(outcome) => self.record(outcome),
        None => break,
      }
    }
  }

  fn record(&mut self, outcome: Outcome) {
    self.tasks.pending = self.tasks.pending.saturating_sub(1);
    match outcome.result {
      Ok(()) => tracing::debug!(op = outcome.op, "operation finished"),
      Err(e) => {
        tracing::warn!(op = outcome.op, error = %e, "operation failed");
        self.status_msg = format!("{} failed", outcome.op);
        self.last_error = Some(e);
      }
    }
  }

  /// Number of spawned operations that have not reported back.
  pub fn pending(&self) -> usize { self.tasks.pending }

  // ── Filtered list ─────────────────────────────────────────────────────────

  /// Returns subjects that match the current filter query.
  pub fn filtered_subjects(&self) -> Vec<&SubjectSummary> {
    if self.filter.is_empty() {
      return self.subjects.iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    self
      .subjects
      .iter()
      .filter(|s| {
        matcher.fuzzy_match(&s.title, &self.filter).is_some()
          || matcher
            .fuzzy_match(&s.subject_type.to_string(), &self.filter)
            .is_some()
      })
      .collect()
  }

  /// The subject under the list cursor in the filtered view, if any.
  pub fn cursor_subject(&self) -> Option<&SubjectSummary> {
    let list = self.filtered_subjects();
    list.get(self.list_cursor).copied()
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    // Filter input mode: all printable keys go into the filter string.
    if self.filter_active {
      return self.handle_filter_key(key).await;
    }

    match self.screen {
      Screen::SubjectList => self.handle_list_key(key).await,
      Screen::EditSubject => self.handle_editor_key(key).await,
    }
  }

  async fn handle_filter_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
        self.list_cursor = 0;
      }
      KeyCode::Enter => {
        self.filter_active = false;
        self.list_cursor = 0;
        // Immediately open the editor if there's exactly one match.
        let list = self.filtered_subjects();
        if list.len() == 1 {
          let id = list[0].subject_id;
          self.open_editor(id).await;
        }
      }
      KeyCode::Backspace => {
        self.filter.pop();
        self.list_cursor = 0;
      }
      KeyCode::Char(c) => {
        self.filter.push(c);
        self.list_cursor = 0;
      }
      _ => {}
    }
    Ok(true)
  }

  async fn handle_list_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      // Quit
      KeyCode::Char('q') => return Ok(false),

      // Navigation
      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.filtered_subjects().len();
        if len > 0 && self.list_cursor + 1 < len {
          self.list_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.list_cursor = self.list_cursor.saturating_sub(1);
      }

      // Open editor
      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if let Some(id) = self.cursor_subject().map(|s| s.subject_id) {
          self.open_editor(id).await;
        }
      }

      // Filter
      KeyCode::Char('/') => {
        self.filter_active = true;
        self.filter.clear();
        self.list_cursor = 0;
      }

      // Refresh
      KeyCode::Char('r') => {
        self.load_subjects().await.ok();
      }

      _ => {}
    }
    Ok(true)
  }

  async fn handle_editor_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    let Some(editor) = self.editor.as_mut() else {
      self.screen = Screen::SubjectList;
      return Ok(true);
    };
    // A spawned cycle raises `mutate_in_flight` only once it is polled, so
    // unreported tasks count as in flight too.
    let busy = self.tasks.pending > 0 || editor.status().mutate_in_flight;

    // New topic/quiz prompt captures every key until submitted or cancelled.
    if let Some(prompt) = editor.prompt.as_mut() {
      match key.code {
        KeyCode::Esc => editor.prompt = None,
        KeyCode::Backspace => {
          prompt.title.pop();
        }
        KeyCode::Char(c) => prompt.title.push(c),
        KeyCode::Enter if !busy => {
          if let Some(prompt) = editor.prompt.take() {
            let coordinator = editor.coordinator.clone();
            match prompt.kind {
              ContentKind::Topic => self.tasks.spawn("add topic", async move {
                coordinator.add_topic(&prompt.title).await
              }),
              ContentKind::Quiz => self.tasks.spawn("add quiz", async move {
                coordinator.add_quiz(&prompt.title).await
              }),
            }
          }
        }
        _ => {}
      }
      return Ok(true);
    }

    match key.code {
      // Leaving a text field commits it.
      KeyCode::Tab => {
        editor.commit_focused(&mut self.tasks);
        editor.focus = editor.focus.next();
      }
      KeyCode::BackTab => {
        editor.commit_focused(&mut self.tasks);
        editor.focus = editor.focus.prev();
      }
      KeyCode::Esc => self.close_editor().await,

      _ => match editor.focus.field() {
        Some(field) => {
          let subject = editor.subject();
          let autosave = editor.autosave(field);
          match key.code {
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
              autosave.revert();
            }
            KeyCode::Char(c) => autosave.edit(subject.as_deref(), |v| v.push(c)),
            KeyCode::Backspace => autosave.edit(subject.as_deref(), |v| {
              v.pop();
            }),
            _ => {}
          }
        }
        None => self.handle_region_key(key, busy),
      },
    }
    Ok(true)
  }

  /// Keys for the non-text regions: Published, Users, Content.
  fn handle_region_key(&mut self, key: KeyEvent, busy: bool) {
    let Some(editor) = self.editor.as_mut() else {
      return;
    };
    let subject = editor.subject();
    let content_len = editor.coordinator.content().len();

    match (editor.focus, key.code) {
      (Focus::Published, KeyCode::Char(' ')) if !busy => {
        if let Some(subject) = subject {
          let coordinator = editor.coordinator.clone();
          let publish = !subject.is_published;
          self
            .tasks
            .spawn("publish", async move { coordinator.set_published(publish).await });
        }
      }

      (Focus::Users, KeyCode::Down | KeyCode::Char('j')) => {
        if editor.user_cursor + 1 < self.users.len() {
          editor.user_cursor += 1;
        }
      }
      (Focus::Users, KeyCode::Up | KeyCode::Char('k')) => {
        editor.user_cursor = editor.user_cursor.saturating_sub(1);
      }
      (Focus::Users, KeyCode::Char(' ')) if !busy => {
        if let (Some(subject), Some(user)) = (subject, self.users.get(editor.user_cursor).cloned()) {
          let coordinator = editor.coordinator.clone();
          if subject.is_assigned(user.user_id) {
            self
              .tasks
              .spawn("unassign", async move { coordinator.unassign_user(&user).await });
          } else {
            self
              .tasks
              .spawn("assign", async move { coordinator.assign_user(&user).await });
          }
        }
      }

      (Focus::Content, KeyCode::Down | KeyCode::Char('j')) => {
        if editor.content_cursor + 1 < content_len {
          editor.content_cursor += 1;
        }
      }
      (Focus::Content, KeyCode::Up | KeyCode::Char('k')) => {
        editor.content_cursor = editor.content_cursor.saturating_sub(1);
      }
      (Focus::Content, KeyCode::Char('t')) => {
        editor.prompt = Some(Prompt { kind: ContentKind::Topic, title: String::new() });
      }
      (Focus::Content, KeyCode::Char('z')) => {
        editor.prompt = Some(Prompt { kind: ContentKind::Quiz, title: String::new() });
      }

      (_, KeyCode::Char('r')) if !busy => {
        let coordinator = editor.coordinator.clone();
        self.tasks.spawn("reload", async move { coordinator.load().await });
      }

      _ => {}
    }
  }

  /// Transition to `EditSubject` for `subject_id` and start loading it.
  async fn open_editor(&mut self, subject_id: Uuid) {
    match self.store.list_users().await {
      Ok(users) => self.users = users,
      Err(e) => self.last_error = Some(e.into()),
    }
    let editor = Editor::new(self.store.clone(), subject_id);
    let coordinator = editor.coordinator.clone();
    self.tasks.spawn("load", async move { coordinator.load().await });
    self.editor = Some(editor);
    self.screen = Screen::EditSubject;
  }

  /// Commit both text fields and return to the list. Stays put if a commit
  /// is rejected so the overlay can be fixed or reverted.
  async fn close_editor(&mut self) {
    let Some(editor) = self.editor.as_ref() else {
      return;
    };
    for autosave in [&editor.title, &editor.description] {
      if let Err(e) = autosave.commit(&editor.coordinator).await {
        self.status_msg = format!("Not saved: {}", e.message);
        self.last_error = Some(e);
        return;
      }
    }

    if let Some(editor) = self.editor.take() {
      editor.coordinator.close();
    }
    self.screen = Screen::SubjectList;
    self.last_error = None;
    self.load_subjects().await.ok();
  }
}
