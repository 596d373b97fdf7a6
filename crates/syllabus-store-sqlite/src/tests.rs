//! Integration tests for `SqliteStore` against an in-memory database.

use syllabus_core::{
  ErrorKind, OperationError,
  draft::{QuizDraft, TopicDraft},
  store::SubjectStore,
  subject::{NewSubject, SubjectPatch, SubjectType},
  user::{NewUser, User},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, name: &str) -> User {
  s.add_user(NewUser {
    full_name: name.into(),
    email:     format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
  })
  .await
  .unwrap()
}

fn new_subject(title: &str) -> NewSubject {
  NewSubject {
    title:        title.into(),
    description:  "Read before day one".into(),
    subject_type: SubjectType::Policy,
    created_by:   None,
  }
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_subject() {
  let s = store().await;
  let author = user(&s, "Ada Lovelace").await;

  let subject = s
    .add_subject(NewSubject { created_by: Some(author.user_id), ..new_subject("  Code of conduct ") })
    .await
    .unwrap();
  assert_eq!(subject.title, "Code of conduct");
  assert_eq!(subject.subject_type, SubjectType::Policy);
  assert!(!subject.is_published);
  assert_eq!(subject.created_by.as_ref(), Some(&author));
  assert_eq!(subject.last_updated_by.as_ref(), Some(&author));
  assert!(subject.topics.is_empty() && subject.quizzes.is_empty());
  assert_eq!(subject.completion_rate, None);

  let fetched = s.get_subject(subject.subject_id).await.unwrap().unwrap();
  assert_eq!(fetched, subject);
}

#[tokio::test]
async fn get_subject_missing_returns_none() {
  let s = store().await;
  assert!(s.get_subject(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn add_subject_rejects_blank_title_and_unknown_author() {
  let s = store().await;
  let err = s.add_subject(new_subject("   ")).await.unwrap_err();
  assert!(matches!(err, Error::Empty("title")));

  let err = s
    .add_subject(NewSubject { created_by: Some(Uuid::new_v4()), ..new_subject("Leave") })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UserNotFound(_)));
}

#[tokio::test]
async fn list_subjects_counts_assignments() {
  let s = store().await;
  let ada = user(&s, "Ada Lovelace").await;
  let first = s.add_subject(new_subject("Security")).await.unwrap();
  s.add_subject(new_subject("Expenses")).await.unwrap();
  s.assign_users(first.subject_id, vec![ada.user_id]).await.unwrap();

  let all = s.list_subjects().await.unwrap();
  assert_eq!(all.len(), 2);
  let security = all.iter().find(|row| row.subject_id == first.subject_id).unwrap();
  assert_eq!(security.users_assigned, 1);
  assert_eq!(security.subject_type, SubjectType::Policy);
}

// ─── Updates ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_applies_only_given_fields() {
  let s = store().await;
  let editor = user(&s, "Grace Hopper").await;
  let subject = s.add_subject(new_subject("Security")).await.unwrap();

  let updated = s
    .update_subject(subject.subject_id, SubjectPatch {
      description: Some("Passwords and badges".into()),
      updated_by: Some(editor.user_id),
      ..SubjectPatch::default()
    })
    .await
    .unwrap();
  assert_eq!(updated.title, "Security");
  assert_eq!(updated.description, "Passwords and badges");
  assert_eq!(updated.last_updated_by.as_ref(), Some(&editor));
  assert!(updated.last_updated_at >= subject.last_updated_at);
  assert_eq!(updated.created_at, subject.created_at);

  let published = s
    .update_subject(subject.subject_id, SubjectPatch::published(true))
    .await
    .unwrap();
  assert!(published.is_published);
  assert_eq!(published.description, "Passwords and badges");
}

#[tokio::test]
async fn update_rejects_empty_title_without_writing() {
  let s = store().await;
  let subject = s.add_subject(new_subject("Security")).await.unwrap();

  let err = s
    .update_subject(subject.subject_id, SubjectPatch::field(
      syllabus_core::subject::SubjectField::Title,
      "  ",
    ))
    .await
    .unwrap_err();
  assert_eq!(OperationError::from(err).kind, ErrorKind::ValidationFailed);

  let fetched = s.get_subject(subject.subject_id).await.unwrap().unwrap();
  assert_eq!(fetched.title, "Security");
}

#[tokio::test]
async fn update_unknown_subject_is_not_found() {
  let s = store().await;
  let err = s
    .update_subject(Uuid::new_v4(), SubjectPatch::published(true))
    .await
    .unwrap_err();
  assert_eq!(OperationError::from(err).kind, ErrorKind::NotFound);
}

// ─── Assignment & completion ─────────────────────────────────────────────────

#[tokio::test]
async fn assignment_is_idempotent_and_reversible() {
  let s = store().await;
  let ada = user(&s, "Ada Lovelace").await;
  let grace = user(&s, "Grace Hopper").await;
  let subject = s.add_subject(new_subject("Security")).await.unwrap();
  let id = subject.subject_id;

  s.assign_users(id, vec![ada.user_id, grace.user_id]).await.unwrap();
  s.assign_users(id, vec![ada.user_id]).await.unwrap();
  let fetched = s.get_subject(id).await.unwrap().unwrap();
  assert_eq!(fetched.users_assigned, vec![ada.clone(), grace.clone()]);

  s.unassign_users(id, vec![ada.user_id]).await.unwrap();
  s.unassign_users(id, vec![ada.user_id]).await.unwrap();
  let fetched = s.get_subject(id).await.unwrap().unwrap();
  assert_eq!(fetched.users_assigned, vec![grace]);
  // Identity fields are untouched by relation changes.
  assert_eq!(fetched.title, subject.title);
  assert_eq!(fetched.last_updated_at, subject.last_updated_at);
}

#[tokio::test]
async fn assigning_unknown_user_fails_without_partial_apply() {
  let s = store().await;
  let ada = user(&s, "Ada Lovelace").await;
  let subject = s.add_subject(new_subject("Security")).await.unwrap();

  let err = s
    .assign_users(subject.subject_id, vec![ada.user_id, Uuid::new_v4()])
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UserNotFound(_)));
  let fetched = s.get_subject(subject.subject_id).await.unwrap().unwrap();
  assert!(fetched.users_assigned.is_empty());
}

#[tokio::test]
async fn completion_rate_follows_publication_and_assignment() {
  let s = store().await;
  let ada = user(&s, "Ada Lovelace").await;
  let grace = user(&s, "Grace Hopper").await;
  let subject = s.add_subject(new_subject("Security")).await.unwrap();
  let id = subject.subject_id;

  s.assign_users(id, vec![ada.user_id, grace.user_id]).await.unwrap();
  s.record_completion(id, ada.user_id).await.unwrap();
  let fetched = s.get_subject(id).await.unwrap().unwrap();
  assert_eq!(fetched.completion_rate, None, "unpublished subjects have no rate");

  s.update_subject(id, SubjectPatch::published(true)).await.unwrap();
  let fetched = s.get_subject(id).await.unwrap().unwrap();
  assert_eq!(fetched.completion_rate, Some(0.5));

  s.unassign_users(id, vec![grace.user_id]).await.unwrap();
  let fetched = s.get_subject(id).await.unwrap().unwrap();
  assert_eq!(fetched.completion_rate, Some(1.0));

  s.unassign_users(id, vec![ada.user_id]).await.unwrap();
  let fetched = s.get_subject(id).await.unwrap().unwrap();
  assert_eq!(fetched.completion_rate, None);

  // The completion survives unassignment.
  s.assign_users(id, vec![ada.user_id]).await.unwrap();
  let fetched = s.get_subject(id).await.unwrap().unwrap();
  assert_eq!(fetched.completion_rate, Some(1.0));
}

#[tokio::test]
async fn completion_requires_assignment() {
  let s = store().await;
  let ada = user(&s, "Ada Lovelace").await;
  let subject = s.add_subject(new_subject("Security")).await.unwrap();

  let err = s.record_completion(subject.subject_id, ada.user_id).await.unwrap_err();
  assert!(matches!(err, Error::NotAssigned { .. }));
  assert_eq!(OperationError::from(err).kind, ErrorKind::ValidationFailed);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let s = store().await;
  user(&s, "Ada Lovelace").await;

  let err = s
    .add_user(NewUser { full_name: "Ada King".into(), email: "ada.lovelace@example.com".into() })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Duplicate { field: "email", .. }));
  assert_eq!(OperationError::from(err).kind, ErrorKind::ValidationFailed);
  assert_eq!(s.list_users().await.unwrap().len(), 1);
}

// ─── Content ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn topics_and_quizzes_are_created_in_place() {
  let s = store().await;
  let subject = s.add_subject(new_subject("Security")).await.unwrap();
  let id = subject.subject_id;

  let topic = s
    .create_topic(TopicDraft { subject_id: id, title: "Passwords".into(), position: 0 })
    .await
    .unwrap();
  let quiz = s
    .create_quiz(QuizDraft { subject_id: id, title: " Password quiz ".into(), position: 1 })
    .await
    .unwrap();
  assert_eq!(quiz.title, "Password quiz");

  let fetched = s.get_subject(id).await.unwrap().unwrap();
  assert_eq!(fetched.topics, vec![topic]);
  assert_eq!(fetched.quizzes, vec![quiz]);
}

#[tokio::test]
async fn content_creation_validates_title_and_owner() {
  let s = store().await;
  let subject = s.add_subject(new_subject("Security")).await.unwrap();

  let err = s
    .create_topic(TopicDraft { subject_id: subject.subject_id, title: " ".into(), position: 0 })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Empty("title")));

  let err = s
    .create_quiz(QuizDraft { subject_id: Uuid::new_v4(), title: "Quiz".into(), position: 0 })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::SubjectNotFound(_)));
}

#[tokio::test]
async fn deleting_a_subject_cascades_to_its_content() {
  let s = store().await;
  let ada = user(&s, "Ada Lovelace").await;
  let subject = s.add_subject(new_subject("Security")).await.unwrap();
  let id = subject.subject_id;
  s.assign_users(id, vec![ada.user_id]).await.unwrap();
  s.create_topic(TopicDraft { subject_id: id, title: "Badges".into(), position: 0 })
    .await
    .unwrap();
  s.create_quiz(QuizDraft { subject_id: id, title: "Badge quiz".into(), position: 1 })
    .await
    .unwrap();

  let id_str = id.hyphenated().to_string();
  let remaining: i64 = s
    .conn
    .call(move |conn| {
      conn.execute("DELETE FROM subjects WHERE subject_id = ?1", [&id_str])?;
      Ok(conn.query_row(
        "SELECT (SELECT COUNT(*) FROM topics)
              + (SELECT COUNT(*) FROM quizzes)
              + (SELECT COUNT(*) FROM subject_users)",
        [],
        |row| row.get(0),
      )?)
    })
    .await
    .unwrap();
  assert_eq!(remaining, 0);
  assert_eq!(s.list_users().await.unwrap(), vec![ada]);
}
