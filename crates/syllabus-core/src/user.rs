//! Users that can be assigned to subjects.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A person known to the console. Users are never edited by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:   Uuid,
  pub full_name: String,
  pub email:     String,
}

/// Input to [`crate::store::SubjectStore::add_user`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
  pub full_name: String,
  pub email:     String,
}
