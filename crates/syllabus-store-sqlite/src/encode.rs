//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings, and
//! `SubjectType` its `SCREAMING_SNAKE_CASE` name.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::Row;
use syllabus_core::{
  content::{Quiz, Topic},
  subject::{Subject, SubjectSummary, SubjectType, completion_rate},
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

// ─── SubjectType ──────────────────────────────────────────────────────────────

pub fn encode_subject_type(t: SubjectType) -> String { t.to_string() }

pub fn decode_subject_type(s: &str) -> Result<SubjectType> {
  SubjectType::from_str(s).map_err(|_| Error::Decode(format!("unknown subject type: {s:?}")))
}

// ─── Position ─────────────────────────────────────────────────────────────────

fn decode_position(p: i64) -> Result<u32> {
  u32::try_from(p).map_err(|_| Error::Decode(format!("position out of range: {p}")))
}

// ─── Raw rows ─────────────────────────────────────────────────────────────────

pub struct RawUser {
  pub user_id:   String,
  pub full_name: String,
  pub email:     String,
}

impl RawUser {
  /// Read three consecutive columns starting at `at`.
  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:   row.get(at)?,
      full_name: row.get(at + 1)?,
      email:     row.get(at + 2)?,
    })
  }

  /// Like [`Self::from_row`] for a LEFT JOIN whose user may be absent.
  pub fn from_optional_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Option<Self>> {
    let user_id: Option<String> = row.get(at)?;
    user_id
      .map(|user_id| {
        Ok(Self { user_id, full_name: row.get(at + 1)?, email: row.get(at + 2)? })
      })
      .transpose()
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:   decode_uuid(&self.user_id)?,
      full_name: self.full_name,
      email:     self.email,
    })
  }
}

pub struct RawEntry {
  pub id:         String,
  pub subject_id: String,
  pub title:      String,
  pub position:   i64,
}

impl RawEntry {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      subject_id: row.get(1)?,
      title:      row.get(2)?,
      position:   row.get(3)?,
    })
  }

  pub fn into_topic(self) -> Result<Topic> {
    Ok(Topic {
      topic_id:   decode_uuid(&self.id)?,
      subject_id: decode_uuid(&self.subject_id)?,
      title:      self.title,
      position:   decode_position(self.position)?,
    })
  }

  pub fn into_quiz(self) -> Result<Quiz> {
    Ok(Quiz {
      quiz_id:    decode_uuid(&self.id)?,
      subject_id: decode_uuid(&self.subject_id)?,
      title:      self.title,
      position:   decode_position(self.position)?,
    })
  }
}

/// The `subjects` row joined with its two audit users.
pub struct RawSubject {
  pub subject_id:      String,
  pub title:           String,
  pub description:     String,
  pub subject_type:    String,
  pub is_published:    bool,
  pub created_at:      String,
  pub last_updated_at: String,
  pub created_by:      Option<RawUser>,
  pub last_updated_by: Option<RawUser>,
}

/// Everything [`crate::SqliteStore`] reads to assemble one [`Subject`].
pub struct RawSubjectBundle {
  pub subject:   RawSubject,
  pub users:     Vec<RawUser>,
  pub topics:    Vec<RawEntry>,
  pub quizzes:   Vec<RawEntry>,
  /// Completions by users that are currently assigned.
  pub completed: i64,
}

impl RawSubjectBundle {
  pub fn into_subject(self) -> Result<Subject> {
    let s = self.subject;
    let users_assigned = self
      .users
      .into_iter()
      .map(RawUser::into_user)
      .collect::<Result<Vec<_>>>()?;
    let completed = usize::try_from(self.completed).unwrap_or_default();

    Ok(Subject {
      subject_id:      decode_uuid(&s.subject_id)?,
      title:           s.title,
      description:     s.description,
      subject_type:    decode_subject_type(&s.subject_type)?,
      is_published:    s.is_published,
      created_by:      s.created_by.map(RawUser::into_user).transpose()?,
      created_at:      decode_dt(&s.created_at)?,
      last_updated_by: s.last_updated_by.map(RawUser::into_user).transpose()?,
      last_updated_at: decode_dt(&s.last_updated_at)?,
      completion_rate: completion_rate(s.is_published, users_assigned.len(), completed),
      users_assigned,
      topics:          self.topics.into_iter().map(RawEntry::into_topic).collect::<Result<_>>()?,
      quizzes:         self.quizzes.into_iter().map(RawEntry::into_quiz).collect::<Result<_>>()?,
    })
  }
}

pub struct RawSummary {
  pub subject_id:      String,
  pub title:           String,
  pub subject_type:    String,
  pub is_published:    bool,
  pub last_updated_at: String,
  pub users_assigned:  i64,
}

impl RawSummary {
  pub fn into_summary(self) -> Result<SubjectSummary> {
    Ok(SubjectSummary {
      subject_id:      decode_uuid(&self.subject_id)?,
      title:           self.title,
      subject_type:    decode_subject_type(&self.subject_type)?,
      is_published:    self.is_published,
      last_updated_at: decode_dt(&self.last_updated_at)?,
      users_assigned:  usize::try_from(self.users_assigned).unwrap_or_default(),
    })
  }
}
