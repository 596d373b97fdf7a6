//! Handlers for `/users`.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use syllabus_core::{
  store::SubjectStore,
  user::{NewUser, User},
};

use crate::error::ApiError;

/// `GET /users`
pub async fn list<S: SubjectStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<User>>, ApiError> {
  Ok(Json(store.list_users().await.map_err(ApiError::store)?))
}

/// `POST /users`: returns 201 + the stored user.
pub async fn create<S: SubjectStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewUser>,
) -> Result<impl IntoResponse, ApiError> {
  let user = store.add_user(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(user)))
}
