//! Handlers for `/topics` and `/quizzes`.
//!
//! Both take a draft whose `position` was allocated by the client from the
//! merged length of the subject it last fetched. The store does not reorder.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use syllabus_core::{
  draft::{QuizDraft, TopicDraft},
  store::SubjectStore,
};

use crate::error::ApiError;

/// `POST /topics`: returns 201 + the stored topic.
pub async fn create_topic<S: SubjectStore>(
  State(store): State<Arc<S>>,
  Json(draft): Json<TopicDraft>,
) -> Result<impl IntoResponse, ApiError> {
  let topic = store.create_topic(draft).await.map_err(ApiError::store)?;
  tracing::debug!(topic_id = %topic.topic_id, position = topic.position, "topic created");
  Ok((StatusCode::CREATED, Json(topic)))
}

/// `POST /quizzes`: returns 201 + the stored quiz.
pub async fn create_quiz<S: SubjectStore>(
  State(store): State<Arc<S>>,
  Json(draft): Json<QuizDraft>,
) -> Result<impl IntoResponse, ApiError> {
  let quiz = store.create_quiz(draft).await.map_err(ApiError::store)?;
  tracing::debug!(quiz_id = %quiz.quiz_id, position = quiz.position, "quiz created");
  Ok((StatusCode::CREATED, Json(quiz)))
}
