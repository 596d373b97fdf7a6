//! Error taxonomy shared by every layer of Syllabus.
//!
//! Store backends and transports keep their own error enums; each converts
//! into [`OperationError`] so that the coordinator, the API, and the terminal
//! client all speak the same four kinds.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// The category of a failed fetch or mutation.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum ErrorKind {
  /// A subject, topic, quiz, or user identifier did not resolve.
  NotFound,
  /// A title or field value was rejected.
  ValidationFailed,
  /// The transport failed before a response was received.
  NetworkFailure,
  /// Anything else.
  Unknown,
}

/// A categorised failure surfaced to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct OperationError {
  pub kind:    ErrorKind,
  pub message: String,
}

impl OperationError {
  pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
    Self { kind, message: message.into() }
  }

  pub fn not_found(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::NotFound, message)
  }

  pub fn validation(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::ValidationFailed, message)
  }

  pub fn network(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::NetworkFailure, message)
  }

  pub fn unknown(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::Unknown, message)
  }
}

impl From<std::convert::Infallible> for OperationError {
  fn from(e: std::convert::Infallible) -> Self { match e {} }
}

pub type Result<T, E = OperationError> = std::result::Result<T, E>;
