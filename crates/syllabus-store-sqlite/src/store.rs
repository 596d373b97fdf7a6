//! [`SqliteStore`]: the SQLite implementation of [`SubjectStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use syllabus_core::{
  content::{Quiz, Topic},
  draft::{QuizDraft, TopicDraft},
  store::SubjectStore,
  subject::{NewSubject, Subject, SubjectPatch, SubjectSummary},
  user::{NewUser, User},
};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    RawEntry, RawSubject, RawSubjectBundle, RawSummary, RawUser, encode_dt, encode_subject_type,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Syllabus store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

/// Trim a required text field, rejecting blanks.
fn required(value: &str, what: &'static str) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::Empty(what));
  }
  Ok(trimmed.to_owned())
}

/// Read a subject and everything it owns. Runs on the connection thread.
fn read_subject(
  conn: &rusqlite::Connection,
  id: &str,
) -> rusqlite::Result<Option<RawSubjectBundle>> {
  let subject = conn
    .query_row(
      "SELECT
         s.subject_id, s.title, s.description, s.subject_type, s.is_published,
         s.created_at, s.last_updated_at,
         cu.user_id, cu.full_name, cu.email,
         uu.user_id, uu.full_name, uu.email
       FROM subjects s
       LEFT JOIN users cu ON cu.user_id = s.created_by
       LEFT JOIN users uu ON uu.user_id = s.last_updated_by
       WHERE s.subject_id = ?1",
      rusqlite::params![id],
      |row| {
        Ok(RawSubject {
          subject_id:      row.get(0)?,
          title:           row.get(1)?,
          description:     row.get(2)?,
          subject_type:    row.get(3)?,
          is_published:    row.get(4)?,
          created_at:      row.get(5)?,
          last_updated_at: row.get(6)?,
          created_by:      RawUser::from_optional_row(row, 7)?,
          last_updated_by: RawUser::from_optional_row(row, 10)?,
        })
      },
    )
    .optional()?;

  let Some(subject) = subject else {
    return Ok(None);
  };

  let users = conn
    .prepare(
      "SELECT u.user_id, u.full_name, u.email
       FROM subject_users su
       JOIN users u ON u.user_id = su.user_id
       WHERE su.subject_id = ?1
       ORDER BY u.full_name",
    )?
    .query_map(rusqlite::params![id], |row| RawUser::from_row(row, 0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let topics = conn
    .prepare(
      "SELECT topic_id, subject_id, title, position FROM topics
       WHERE subject_id = ?1 ORDER BY position",
    )?
    .query_map(rusqlite::params![id], RawEntry::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let quizzes = conn
    .prepare(
      "SELECT quiz_id, subject_id, title, position FROM quizzes
       WHERE subject_id = ?1 ORDER BY position",
    )?
    .query_map(rusqlite::params![id], RawEntry::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let completed: i64 = conn.query_row(
    "SELECT COUNT(*) FROM completions c
     JOIN subject_users su ON su.subject_id = c.subject_id AND su.user_id = c.user_id
     WHERE c.subject_id = ?1",
    rusqlite::params![id],
    |row| row.get(0),
  )?;

  Ok(Some(RawSubjectBundle { subject, users, topics, quizzes, completed }))
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    tracing::debug!(path = %path.as_ref().display(), "opening sqlite store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn exists(&self, sql: &'static str, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(sql, rusqlite::params![id_str], |_| Ok(()))
            .optional()?
            .is_some(),
        )
      })
      .await?;
    Ok(found)
  }

  async fn ensure_subject(&self, id: Uuid) -> Result<()> {
    if !self.exists("SELECT 1 FROM subjects WHERE subject_id = ?1", id).await? {
      return Err(Error::SubjectNotFound(id));
    }
    Ok(())
  }

  async fn ensure_user(&self, id: Uuid) -> Result<()> {
    if !self.exists("SELECT 1 FROM users WHERE user_id = ?1", id).await? {
      return Err(Error::UserNotFound(id));
    }
    Ok(())
  }

  async fn ensure_assigned(&self, subject: Uuid, user: Uuid) -> Result<()> {
    let subject_str = encode_uuid(subject);
    let user_str = encode_uuid(user);
    let assigned = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM subject_users WHERE subject_id = ?1 AND user_id = ?2",
              rusqlite::params![subject_str, user_str],
              |_| Ok(()),
            )
            .optional()?
            .is_some(),
        )
      })
      .await?;
    if !assigned {
      return Err(Error::NotAssigned { subject, user });
    }
    Ok(())
  }

  /// Insert a topic or quiz row and return its new identifier and stored
  /// title. `table` and `id_column` are compile-time constants.
  async fn insert_entry(
    &self,
    table: &'static str,
    id_column: &'static str,
    subject_id: Uuid,
    title: &str,
    position: u32,
  ) -> Result<(Uuid, String)> {
    let title = required(title, "title")?;
    self.ensure_subject(subject_id).await?;

    let id = Uuid::new_v4();
    let id_str = encode_uuid(id);
    let subject_str = encode_uuid(subject_id);
    let stored_title = title.clone();
    let sql = format!(
      "INSERT INTO {table} ({id_column}, subject_id, title, position) VALUES (?1, ?2, ?3, ?4)"
    );

    self
      .conn
      .call(move |conn| {
        conn.execute(&sql, rusqlite::params![id_str, subject_str, stored_title, position])?;
        Ok(())
      })
      .await?;
    Ok((id, title))
  }
}

// ─── SubjectStore impl ───────────────────────────────────────────────────────

impl SubjectStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:   Uuid::new_v4(),
      full_name: required(&input.full_name, "full name")?,
      email:     required(&input.email, "email")?,
    };

    let id_str = encode_uuid(user.user_id);
    let name = user.full_name.clone();
    let email = user.email.clone();

    let inserted = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "INSERT INTO users (user_id, full_name, email) VALUES (?1, ?2, ?3)
           ON CONFLICT (email) DO NOTHING",
          rusqlite::params![id_str, name, email],
        )?;
        Ok(changed > 0)
      })
      .await?;
    if !inserted {
      return Err(Error::Duplicate { field: "email", value: user.email });
    }

    Ok(user)
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let rows = conn
          .prepare("SELECT user_id, full_name, email FROM users ORDER BY full_name")?
          .query_map([], |row| RawUser::from_row(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn add_subject(&self, input: NewSubject) -> Result<Subject> {
    let title = required(&input.title, "title")?;
    if let Some(author) = input.created_by {
      self.ensure_user(author).await?;
    }

    let subject_id = Uuid::new_v4();
    let id_str = encode_uuid(subject_id);
    let type_str = encode_subject_type(input.subject_type);
    let author_str = input.created_by.map(encode_uuid);
    let now_str = encode_dt(Utc::now());
    let description = input.description;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subjects (
             subject_id, title, description, subject_type, is_published,
             created_by, created_at, last_updated_by, last_updated_at
           ) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?5, ?6)",
          rusqlite::params![id_str, title, description, type_str, author_str, now_str],
        )?;
        Ok(())
      })
      .await?;

    self
      .get_subject(subject_id)
      .await?
      .ok_or(Error::SubjectNotFound(subject_id))
  }

  async fn list_subjects(&self) -> Result<Vec<SubjectSummary>> {
    let raws: Vec<RawSummary> = self
      .conn
      .call(|conn| {
        let rows = conn
          .prepare(
            "SELECT
               s.subject_id, s.title, s.subject_type, s.is_published, s.last_updated_at,
               (SELECT COUNT(*) FROM subject_users su WHERE su.subject_id = s.subject_id)
             FROM subjects s
             ORDER BY s.last_updated_at DESC",
          )?
          .query_map([], |row| {
            Ok(RawSummary {
              subject_id:      row.get(0)?,
              title:           row.get(1)?,
              subject_type:    row.get(2)?,
              is_published:    row.get(3)?,
              last_updated_at: row.get(4)?,
              users_assigned:  row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSummary::into_summary).collect()
  }

  async fn get_subject(&self, id: Uuid) -> Result<Option<Subject>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(read_subject(conn, &id_str)?))
      .await?;

    raw.map(RawSubjectBundle::into_subject).transpose()
  }

  async fn update_subject(&self, id: Uuid, patch: SubjectPatch) -> Result<Subject> {
    let title = patch.title.as_deref().map(|t| required(t, "title")).transpose()?;
    if let Some(actor) = patch.updated_by {
      self.ensure_user(actor).await?;
    }

    if !patch.is_empty() {
      let id_str = encode_uuid(id);
      let actor_str = patch.updated_by.map(encode_uuid);
      let now_str = encode_dt(Utc::now());
      let description = patch.description;
      let is_published = patch.is_published;

      let changed = self
        .conn
        .call(move |conn| {
          Ok(conn.execute(
            "UPDATE subjects SET
               title           = COALESCE(?2, title),
               description     = COALESCE(?3, description),
               is_published    = COALESCE(?4, is_published),
               last_updated_by = ?5,
               last_updated_at = ?6
             WHERE subject_id = ?1",
            rusqlite::params![id_str, title, description, is_published, actor_str, now_str],
          )?)
        })
        .await?;
      if changed == 0 {
        return Err(Error::SubjectNotFound(id));
      }
    }

    self.get_subject(id).await?.ok_or(Error::SubjectNotFound(id))
  }

  // ── Assignment ────────────────────────────────────────────────────────────

  async fn assign_users(&self, id: Uuid, user_ids: Vec<Uuid>) -> Result<()> {
    self.ensure_subject(id).await?;
    for user in &user_ids {
      self.ensure_user(*user).await?;
    }

    let id_str = encode_uuid(id);
    let user_strs: Vec<String> = user_ids.into_iter().map(encode_uuid).collect();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for user in &user_strs {
          tx.execute(
            "INSERT OR IGNORE INTO subject_users (subject_id, user_id) VALUES (?1, ?2)",
            rusqlite::params![id_str, user],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn unassign_users(&self, id: Uuid, user_ids: Vec<Uuid>) -> Result<()> {
    self.ensure_subject(id).await?;

    let id_str = encode_uuid(id);
    let user_strs: Vec<String> = user_ids.into_iter().map(encode_uuid).collect();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for user in &user_strs {
          tx.execute(
            "DELETE FROM subject_users WHERE subject_id = ?1 AND user_id = ?2",
            rusqlite::params![id_str, user],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn record_completion(&self, id: Uuid, user_id: Uuid) -> Result<()> {
    self.ensure_subject(id).await?;
    self.ensure_user(user_id).await?;
    self.ensure_assigned(id, user_id).await?;

    let id_str = encode_uuid(id);
    let user_str = encode_uuid(user_id);
    let now_str = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO completions (subject_id, user_id, completed_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, user_str, now_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Content ───────────────────────────────────────────────────────────────

  async fn create_topic(&self, draft: TopicDraft) -> Result<Topic> {
    let (topic_id, title) = self
      .insert_entry("topics", "topic_id", draft.subject_id, &draft.title, draft.position)
      .await?;
    Ok(Topic { topic_id, subject_id: draft.subject_id, title, position: draft.position })
  }

  async fn create_quiz(&self, draft: QuizDraft) -> Result<Quiz> {
    let (quiz_id, title) = self
      .insert_entry("quizzes", "quiz_id", draft.subject_id, &draft.title, draft.position)
      .await?;
    Ok(Quiz { quiz_id, subject_id: draft.subject_id, title, position: draft.position })
  }
}
