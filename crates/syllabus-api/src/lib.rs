//! JSON REST API for Syllabus.
//!
//! Exposes an axum [`Router`] backed by any [`syllabus_core::store::SubjectStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", syllabus_api::api_router(store.clone()))
//! ```

pub mod content;
pub mod error;
pub mod subjects;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use syllabus_core::store::SubjectStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: SubjectStore + 'static,
{
  Router::new()
    // Subjects
    .route("/subjects", get(subjects::list::<S>).post(subjects::create::<S>))
    .route(
      "/subjects/{id}",
      get(subjects::get_one::<S>).patch(subjects::patch_one::<S>),
    )
    .route("/subjects/{id}/assign", post(subjects::assign::<S>))
    .route("/subjects/{id}/unassign", post(subjects::unassign::<S>))
    .route("/subjects/{id}/completions", post(subjects::complete::<S>))
    // Content
    .route("/topics", post(content::create_topic::<S>))
    .route("/quizzes", post(content::create_quiz::<S>))
    // Users
    .route("/users", get(users::list::<S>).post(users::create::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests;
