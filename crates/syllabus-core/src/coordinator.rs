//! [`SubjectCoordinator`]: the single writer of a loaded subject.
//!
//! Every state-changing operation runs the same two-phase cycle: issue the
//! mutation, and only if it succeeds, refetch the whole subject and replace the
//! local snapshot. A failed mutation never reaches the refetch phase, so the
//! snapshot is always exactly some fetched server state.
//!
//! Cycles are tagged with a ticket when their mutation is issued. A fetched
//! subject is applied only if its ticket is newer than the last applied one,
//! so if callers overlap cycles the later-issued one wins no matter which
//! response lands first. Callers are still expected to hold off new mutations
//! while [`Status::mutate_in_flight`] is set.

use std::{
  future::Future,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
  OperationError, Result,
  content::{ContentEntry, duplicate_positions, merge},
  draft::{new_quiz, new_topic, next_position, validate_title},
  store::SubjectStore,
  subject::{Subject, SubjectField, SubjectPatch},
  user::User,
};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Where the coordinator is in its mutate-then-refetch cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
  #[default]
  Idle,
  Mutating,
  Refetching,
}

/// Flags the presentation layer gates its controls on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status {
  pub phase:            Phase,
  /// A fetch (initial load or post-mutation refetch) is outstanding.
  pub fetch_in_flight:  bool,
  /// A cycle has been issued and its refetch has not landed yet.
  pub mutate_in_flight: bool,
  /// Incremented every time a fetched subject replaces the snapshot.
  pub revision:         u64,
}

// ─── State cell ──────────────────────────────────────────────────────────────

/// A fetched subject together with the merged sequence computed from it.
struct Snapshot {
  subject: Arc<Subject>,
  content: Arc<[ContentEntry]>,
}

#[derive(Default)]
struct State {
  snapshot:       Option<Snapshot>,
  last_ticket:    u64,
  applied_ticket: u64,
  loading:        usize,
  mutating:       usize,
  refetching:     usize,
  revision:       u64,
  closed:         bool,
}

impl State {
  fn status(&self) -> Status {
    let phase = if self.mutating > 0 {
      Phase::Mutating
    } else if self.refetching > 0 {
      Phase::Refetching
    } else {
      Phase::Idle
    };
    Status {
      phase,
      fetch_in_flight: self.loading + self.refetching > 0,
      mutate_in_flight: self.mutating + self.refetching > 0,
      revision: self.revision,
    }
  }

  fn issue_ticket(&mut self) -> u64 {
    self.last_ticket += 1;
    self.last_ticket
  }

  fn apply(&mut self, ticket: u64, subject: Subject) {
    if self.closed {
      debug!(ticket, "coordinator closed; dropping fetched subject");
      return;
    }
    if ticket <= self.applied_ticket {
      debug!(ticket, applied = self.applied_ticket, "dropping stale fetch result");
      return;
    }

    let content: Arc<[ContentEntry]> = merge(&subject.topics, &subject.quizzes).into();
    let dupes = duplicate_positions(&content);
    if !dupes.is_empty() {
      warn!(subject_id = %subject.subject_id, positions = ?dupes, "content positions are not unique");
    }

    self.snapshot = Some(Snapshot { subject: Arc::new(subject), content });
    self.applied_ticket = ticket;
    self.revision += 1;
  }
}

// ─── Coordinator ─────────────────────────────────────────────────────────────

/// Orchestrates every mutation against one subject and owns its snapshot.
pub struct SubjectCoordinator<S> {
  store:      Arc<S>,
  subject_id: Uuid,
  state:      Mutex<State>,
  status:     watch::Sender<Status>,
}

impl<S: SubjectStore> SubjectCoordinator<S> {
  /// Create a coordinator for `subject_id`. Nothing is fetched until
  /// [`Self::load`] is called.
  pub fn new(store: Arc<S>, subject_id: Uuid) -> Self {
    Self {
      store,
      subject_id,
      state: Mutex::new(State::default()),
      status: watch::Sender::new(Status::default()),
    }
  }

  pub fn subject_id(&self) -> Uuid { self.subject_id }

  /// The last applied subject, if any fetch has succeeded.
  pub fn subject(&self) -> Option<Arc<Subject>> {
    self.lock().snapshot.as_ref().map(|s| s.subject.clone())
  }

  /// The merged topic/quiz sequence of the current snapshot.
  pub fn content(&self) -> Arc<[ContentEntry]> {
    self
      .lock()
      .snapshot
      .as_ref()
      .map_or_else(|| Arc::from(Vec::new()), |s| s.content.clone())
  }

  pub fn status(&self) -> Status { self.lock().status() }

  /// Receive every status change, including snapshot revisions.
  pub fn subscribe(&self) -> watch::Receiver<Status> { self.status.subscribe() }

  /// Mark the coordinator torn down; results that land afterwards are dropped.
  pub fn close(&self) { self.update(|s| s.closed = true); }

  // ── Operations ────────────────────────────────────────────────────────────

  /// Fetch the subject and replace the snapshot.
  pub async fn load(&self) -> Result<()> {
    let ticket = self.update(|s| {
      s.loading += 1;
      s.issue_ticket()
    });
    let fetched = self.fetch().await;
    self.update(|s| {
      s.loading -= 1;
      fetched.map(|subject| s.apply(ticket, subject))
    })
  }

  pub async fn update_field(&self, field: SubjectField, value: impl Into<String>) -> Result<()> {
    self.require_loaded()?;
    let patch = SubjectPatch::field(field, value);
    self
      .run_cycle("update_field", self.store.update_subject(self.subject_id, patch))
      .await
  }

  pub async fn set_published(&self, is_published: bool) -> Result<()> {
    self.require_loaded()?;
    let patch = SubjectPatch::published(is_published);
    self
      .run_cycle("set_published", self.store.update_subject(self.subject_id, patch))
      .await
  }

  pub async fn assign_user(&self, user: &User) -> Result<()> {
    self.require_loaded()?;
    self
      .run_cycle(
        "assign_user",
        self.store.assign_users(self.subject_id, vec![user.user_id]),
      )
      .await
  }

  pub async fn unassign_user(&self, user: &User) -> Result<()> {
    self.require_loaded()?;
    self
      .run_cycle(
        "unassign_user",
        self.store.unassign_users(self.subject_id, vec![user.user_id]),
      )
      .await
  }

  /// Append a topic after the current last entry.
  pub async fn add_topic(&self, title: &str) -> Result<()> {
    let title = validate_title(title)?;
    let draft = new_topic(self.subject_id, self.insertion_point()?, &title)?;
    self.run_cycle("add_topic", self.store.create_topic(draft)).await
  }

  /// Append a quiz after the current last entry.
  pub async fn add_quiz(&self, title: &str) -> Result<()> {
    let title = validate_title(title)?;
    let draft = new_quiz(self.subject_id, self.insertion_point()?, &title)?;
    self.run_cycle("add_quiz", self.store.create_quiz(draft)).await
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  async fn run_cycle<T>(
    &self,
    op: &'static str,
    mutation: impl Future<Output = Result<T, S::Error>>,
  ) -> Result<()> {
    let ticket = self.update(|s| {
      s.mutating += 1;
      s.issue_ticket()
    });
    debug!(subject_id = %self.subject_id, ticket, op, "mutation issued");

    if let Err(e) = mutation.await {
      let err: OperationError = e.into();
      warn!(subject_id = %self.subject_id, ticket, op, error = %err, "mutation failed");
      self.update(|s| s.mutating -= 1);
      return Err(err);
    }

    self.update(|s| {
      s.mutating -= 1;
      s.refetching += 1;
    });
    let fetched = self.fetch().await;
    if let Err(e) = &fetched {
      warn!(subject_id = %self.subject_id, ticket, op, error = %e, "refetch after mutation failed");
    }
    self.update(|s| {
      s.refetching -= 1;
      fetched.map(|subject| s.apply(ticket, subject))
    })
  }

  async fn fetch(&self) -> Result<Subject> {
    self
      .store
      .get_subject(self.subject_id)
      .await
      .map_err(Into::<OperationError>::into)?
      .ok_or_else(|| OperationError::not_found(format!("subject {} not found", self.subject_id)))
  }

  fn require_loaded(&self) -> Result<()> {
    if self.lock().snapshot.is_none() {
      return Err(OperationError::not_found(format!(
        "subject {} is not loaded",
        self.subject_id
      )));
    }
    Ok(())
  }

  /// Position for a new entry, derived from the latest applied snapshot.
  fn insertion_point(&self) -> Result<u32> {
    self.require_loaded()?;
    Ok(next_position(self.content().len()))
  }

  fn lock(&self) -> MutexGuard<'_, State> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Mutate the state cell and publish the resulting status.
  fn update<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
    let mut state = self.lock();
    let out = f(&mut state);
    self.status.send_replace(state.status());
    out
  }
}
