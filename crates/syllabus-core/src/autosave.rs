//! Commit-on-blur buffers for free-text subject fields.
//!
//! Each [`AutosaveField`] holds the text the user is typing as an overlay over
//! the coordinator's snapshot. Nothing is sent on keystrokes; [`commit`]
//! (called when the field loses focus) issues one `update_field` cycle with
//! the buffered value. Fields are independent: committing or editing one never
//! touches another's buffer.
//!
//! [`commit`]: AutosaveField::commit

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{
  Result,
  coordinator::SubjectCoordinator,
  store::SubjectStore,
  subject::{Subject, SubjectField},
};

/// How a commit behaves while an earlier commit of the same field is still
/// running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommitPolicy {
  /// Wait for the earlier cycle, including its refetch, before issuing.
  #[default]
  Sequential,
  /// Issue immediately; the later-issued refetch wins.
  Race,
}

pub struct AutosaveField {
  field:  SubjectField,
  policy: CommitPolicy,
  local:  Mutex<Option<String>>,
  turn:   tokio::sync::Mutex<()>,
}

impl AutosaveField {
  pub fn new(field: SubjectField) -> Self { Self::with_policy(field, CommitPolicy::default()) }

  pub fn with_policy(field: SubjectField, policy: CommitPolicy) -> Self {
    Self {
      field,
      policy,
      local: Mutex::new(None),
      turn: tokio::sync::Mutex::new(()),
    }
  }

  pub fn field(&self) -> SubjectField { self.field }

  /// Replace the buffered value (one keystroke-equivalent input event).
  pub fn input(&self, value: impl Into<String>) { *self.lock() = Some(value.into()); }

  /// Edit the buffered value in place, starting from the authoritative value
  /// when nothing is buffered yet.
  pub fn edit(&self, subject: Option<&Subject>, f: impl FnOnce(&mut String)) {
    let mut local = self.lock();
    let value = local.get_or_insert_with(|| {
      subject.map(|s| s.field(self.field).to_owned()).unwrap_or_default()
    });
    f(value);
  }

  /// The buffered value, if the user has typed since the last commit.
  pub fn local_value(&self) -> Option<String> { self.lock().clone() }

  pub fn is_dirty(&self) -> bool { self.lock().is_some() }

  /// What the field should show: the overlay if present, else `subject`.
  pub fn display(&self, subject: Option<&Subject>) -> String {
    match &*self.lock() {
      Some(local) => local.clone(),
      None => subject.map(|s| s.field(self.field).to_owned()).unwrap_or_default(),
    }
  }

  /// Drop the overlay without committing it.
  pub fn revert(&self) { *self.lock() = None; }

  /// Send the buffered value through `coordinator`.
  ///
  /// On success the overlay collapses, unless the user typed something newer
  /// while the cycle was running. On failure the overlay is kept.
  pub async fn commit<S: SubjectStore>(&self, coordinator: &SubjectCoordinator<S>) -> Result<()> {
    let _turn = match self.policy {
      CommitPolicy::Sequential => Some(self.turn.lock().await),
      CommitPolicy::Race => None,
    };

    let Some(value) = self.local_value() else {
      return Ok(());
    };
    let unchanged = coordinator
      .subject()
      .is_some_and(|s| s.field(self.field) == value);
    if !unchanged {
      coordinator.update_field(self.field, value.clone()).await?;
    }
    self.collapse(&value);
    Ok(())
  }

  fn collapse(&self, committed: &str) {
    let mut local = self.lock();
    if local.as_deref() == Some(committed) {
      *local = None;
    }
  }

  fn lock(&self) -> MutexGuard<'_, Option<String>> {
    self.local.lock().unwrap_or_else(PoisonError::into_inner)
  }
}
