//! Subject, the root curriculum entity.
//!
//! A subject owns its topics and quizzes outright and carries the set of users
//! assigned to it. The completion rate is derived by the store on read and is
//! never written by clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{
  content::{Quiz, Topic},
  user::User,
};

/// What a subject is about. Fixed at creation; no patch field exists for it.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SubjectType {
  Company,
  Policy,
  Process,
  Other,
}

/// A subject as last returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id:      Uuid,
  pub title:           String,
  pub description:     String,
  pub subject_type:    SubjectType,
  pub is_published:    bool,
  pub created_by:      Option<User>,
  pub created_at:      DateTime<Utc>,
  pub last_updated_by: Option<User>,
  pub last_updated_at: DateTime<Utc>,
  pub users_assigned:  Vec<User>,
  /// Fraction of assigned users who completed the subject; `None` while the
  /// subject is unpublished or nobody is assigned.
  pub completion_rate: Option<f64>,
  pub topics:          Vec<Topic>,
  pub quizzes:         Vec<Quiz>,
}

impl Subject {
  /// Current authoritative value of a free-text field.
  pub fn field(&self, field: SubjectField) -> &str {
    match field {
      SubjectField::Title => &self.title,
      SubjectField::Description => &self.description,
    }
  }

  pub fn is_assigned(&self, user_id: Uuid) -> bool {
    self.users_assigned.iter().any(|u| u.user_id == user_id)
  }
}

/// Completion rate as reported on [`Subject::completion_rate`].
///
/// Unpublished subjects and subjects nobody is assigned to have no rate.
/// `completed` counts only users that are still assigned.
pub fn completion_rate(is_published: bool, assigned: usize, completed: usize) -> Option<f64> {
  if !is_published || assigned == 0 {
    return None;
  }
  Some(completed.min(assigned) as f64 / assigned as f64)
}

/// The row shape returned by [`crate::store::SubjectStore::list_subjects`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectSummary {
  pub subject_id:      Uuid,
  pub title:           String,
  pub subject_type:    SubjectType,
  pub is_published:    bool,
  pub last_updated_at: DateTime<Utc>,
  pub users_assigned:  usize,
}

/// Input to [`crate::store::SubjectStore::add_subject`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubject {
  pub title:        String,
  #[serde(default)]
  pub description:  String,
  pub subject_type: SubjectType,
  #[serde(default)]
  pub created_by:   Option<Uuid>,
}

// ─── Patches ─────────────────────────────────────────────────────────────────

/// A free-text subject field editable through autosave.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubjectField {
  Title,
  Description,
}

/// A partial update; `None` fields are left untouched by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title:        Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub is_published: Option<bool>,
  /// The acting user, stamped by the transport rather than the caller.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub updated_by:   Option<Uuid>,
}

impl SubjectPatch {
  /// A patch that sets exactly one free-text field.
  pub fn field(field: SubjectField, value: impl Into<String>) -> Self {
    let value = Some(value.into());
    match field {
      SubjectField::Title => Self { title: value, ..Self::default() },
      SubjectField::Description => Self { description: value, ..Self::default() },
    }
  }

  pub fn published(is_published: bool) -> Self {
    Self { is_published: Some(is_published), ..Self::default() }
  }

  /// True when the patch would change nothing.
  pub fn is_empty(&self) -> bool {
    self.title.is_none() && self.description.is_none() && self.is_published.is_none()
  }
}
