//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use syllabus_core::{ErrorKind, OperationError};
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error(transparent)]
  Operation(#[from] OperationError),
}

impl ApiError {
  /// Convert a backend error into the shared taxonomy.
  pub fn store<E: Into<OperationError>>(e: E) -> Self { Self::Operation(e.into()) }

  pub fn kind(&self) -> ErrorKind {
    match self {
      ApiError::NotFound(_) => ErrorKind::NotFound,
      ApiError::Operation(e) => e.kind,
    }
  }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
  match kind {
    ErrorKind::NotFound => StatusCode::NOT_FOUND,
    ErrorKind::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
    ErrorKind::NetworkFailure => StatusCode::BAD_GATEWAY,
    ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let kind = self.kind();
    let message = match &self {
      ApiError::NotFound(m) => m.clone(),
      ApiError::Operation(e) => e.message.clone(),
    };
    if kind == ErrorKind::Unknown {
      tracing::error!(error = %message, "request failed");
    }
    (status_for(kind), Json(json!({ "kind": kind, "error": message }))).into_response()
  }
}
