//! Handlers for `/subjects` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/subjects` | Optional `?subject_type=POLICY` and `?published=true` |
//! | `POST`  | `/subjects` | Body: [`NewSubject`] |
//! | `GET`   | `/subjects/{id}` | 404 if not found |
//! | `PATCH` | `/subjects/{id}` | Body: [`SubjectPatch`] |
//! | `POST`  | `/subjects/{id}/assign` | Body: `{"user_ids":[...]}` |
//! | `POST`  | `/subjects/{id}/unassign` | Body: `{"user_ids":[...]}` |
//! | `POST`  | `/subjects/{id}/completions` | Body: `{"user_id":"..."}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use syllabus_core::{
  store::SubjectStore,
  subject::{NewSubject, Subject, SubjectPatch, SubjectSummary, SubjectType},
};
use uuid::Uuid;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub subject_type: Option<SubjectType>,
  pub published:    Option<bool>,
}

/// `GET /subjects[?subject_type=<type>][&published=<bool>]`
pub async fn list<S: SubjectStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<SubjectSummary>>, ApiError> {
  let mut subjects = store.list_subjects().await.map_err(ApiError::store)?;
  subjects.retain(|s| {
    params.subject_type.is_none_or(|t| s.subject_type == t)
      && params.published.is_none_or(|p| s.is_published == p)
  });
  Ok(Json(subjects))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /subjects`: returns 201 + the stored subject.
pub async fn create<S: SubjectStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewSubject>,
) -> Result<impl IntoResponse, ApiError> {
  let subject = store.add_subject(body).await.map_err(ApiError::store)?;
  tracing::info!(subject_id = %subject.subject_id, "subject created");
  Ok((StatusCode::CREATED, Json(subject)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /subjects/{id}`
pub async fn get_one<S: SubjectStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Subject>, ApiError> {
  let subject = store
    .get_subject(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {id} not found")))?;
  Ok(Json(subject))
}

// ─── Patch ────────────────────────────────────────────────────────────────────

/// `PATCH /subjects/{id}`: returns the updated subject.
pub async fn patch_one<S: SubjectStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(patch): Json<SubjectPatch>,
) -> Result<Json<Subject>, ApiError> {
  let subject = store.update_subject(id, patch).await.map_err(ApiError::store)?;
  Ok(Json(subject))
}

// ─── Assignment ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UsersBody {
  pub user_ids: Vec<Uuid>,
}

/// `POST /subjects/{id}/assign`
pub async fn assign<S: SubjectStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<UsersBody>,
) -> Result<StatusCode, ApiError> {
  store.assign_users(id, body.user_ids).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /subjects/{id}/unassign`
pub async fn unassign<S: SubjectStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<UsersBody>,
) -> Result<StatusCode, ApiError> {
  store.unassign_users(id, body.user_ids).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Completions ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CompletionBody {
  pub user_id: Uuid,
}

/// `POST /subjects/{id}/completions`
pub async fn complete<S: SubjectStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<CompletionBody>,
) -> Result<StatusCode, ApiError> {
  store.record_completion(id, body.user_id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
