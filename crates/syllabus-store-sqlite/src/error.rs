//! Error type for `syllabus-store-sqlite`.

use syllabus_core::OperationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored column could not be decoded into its domain type.
  #[error("decode error: {0}")]
  Decode(String),

  #[error("subject not found: {0}")]
  SubjectNotFound(uuid::Uuid),

  #[error("user not found: {0}")]
  UserNotFound(uuid::Uuid),

  #[error("user {user} is not assigned to subject {subject}")]
  NotAssigned { subject: uuid::Uuid, user: uuid::Uuid },

  #[error("{0} must not be empty")]
  Empty(&'static str),

  #[error("{field} {value} is already taken")]
  Duplicate { field: &'static str, value: String },
}

impl From<Error> for OperationError {
  fn from(e: Error) -> Self {
    let message = e.to_string();
    match e {
      Error::SubjectNotFound(_) | Error::UserNotFound(_) => OperationError::not_found(message),
      Error::NotAssigned { .. } | Error::Empty(_) | Error::Duplicate { .. } => OperationError::validation(message),
      Error::Database(_) | Error::Uuid(_) | Error::Decode(_) => OperationError::unknown(message),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
