//! The `SubjectStore` trait.
//!
//! Implemented by persistence backends (`syllabus-store-sqlite`) and by the
//! HTTP client in `syllabus-cli`. The coordinator only ever talks to this
//! trait, never to a concrete transport.

use std::future::Future;

use uuid::Uuid;

use crate::{
  OperationError,
  content::{Quiz, Topic},
  draft::{QuizDraft, TopicDraft},
  subject::{NewSubject, Subject, SubjectPatch, SubjectSummary},
  user::{NewUser, User},
};

/// Abstraction over wherever subjects live.
///
/// All methods return `Send` futures so implementations can back an axum
/// router as well as the single-task terminal client.
pub trait SubjectStore: Send + Sync {
  type Error: std::error::Error + Into<OperationError> + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn list_users(&self) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  // ── Subjects ──────────────────────────────────────────────────────────

  /// Create and persist a new, unpublished subject.
  fn add_subject(
    &self,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  fn list_subjects(
    &self,
  ) -> impl Future<Output = Result<Vec<SubjectSummary>, Self::Error>> + Send + '_;

  /// Retrieve a subject with its users, topics, quizzes, and completion rate.
  /// Returns `None` if not found.
  fn get_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// Apply the `Some` fields of `patch` and return the updated subject.
  fn update_subject(
    &self,
    id: Uuid,
    patch: SubjectPatch,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  // ── Assignment ────────────────────────────────────────────────────────

  /// Add users to the subject. Already-assigned users are left as they are.
  fn assign_users(
    &self,
    id: Uuid,
    user_ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove users from the subject. Users not assigned are ignored.
  fn unassign_users(
    &self,
    id: Uuid,
    user_ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Record that `user_id` finished the subject.
  fn record_completion(
    &self,
    id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Content ───────────────────────────────────────────────────────────

  fn create_topic(
    &self,
    draft: TopicDraft,
  ) -> impl Future<Output = Result<Topic, Self::Error>> + Send + '_;

  fn create_quiz(
    &self,
    draft: QuizDraft,
  ) -> impl Future<Output = Result<Quiz, Self::Error>> + Send + '_;
}
