//! Async HTTP client wrapping the Syllabus JSON API.
//!
//! [`ApiClient`] implements [`SubjectStore`], so the editor drives a remote
//! subject through the same coordinator the server-side tests use.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use syllabus_core::{
  ErrorKind, OperationError,
  content::{Quiz, Topic},
  draft::{QuizDraft, TopicDraft},
  store::SubjectStore,
  subject::{NewSubject, Subject, SubjectPatch, SubjectSummary},
  user::{NewUser, User},
};
use thiserror::Error;
use uuid::Uuid;

/// Connection settings for the Syllabus API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  /// Stamped as the author of creations and edits.
  pub actor:    Option<Uuid>,
}

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("{status}: {message}")]
  Status { status: StatusCode, message: String },
}

/// Body of an API error response.
#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

/// The error kind a non-success response maps to.
pub fn kind_for_status(status: StatusCode) -> ErrorKind {
  match status.as_u16() {
    404 => ErrorKind::NotFound,
    400 | 422 => ErrorKind::ValidationFailed,
    502..=504 => ErrorKind::NetworkFailure,
    _ => ErrorKind::Unknown,
  }
}

impl From<ClientError> for OperationError {
  fn from(e: ClientError) -> Self {
    match e {
      ClientError::Transport(e) if e.is_decode() => OperationError::unknown(e.to_string()),
      ClientError::Transport(e) => OperationError::network(e.to_string()),
      ClientError::Status { status, message } => {
        OperationError::new(kind_for_status(status), message)
      }
    }
  }
}

// ─── Client ───────────────────────────────────────────────────────────────────

/// Async HTTP client for the Syllabus JSON REST API.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self, ClientError> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  /// Send `req`, turning non-success statuses into [`ClientError::Status`].
  async fn send(&self, req: RequestBuilder) -> Result<Response, ClientError> {
    let resp = req.send().await?;
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let message = match resp.json::<ErrorBody>().await {
      Ok(body) => body.error,
      Err(_) => status.canonical_reason().unwrap_or("request failed").to_owned(),
    };
    tracing::debug!(%status, %message, "api error");
    Err(ClientError::Status { status, message })
  }

  async fn json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
    Ok(self.send(req).await?.json().await?)
  }
}

impl SubjectStore for ApiClient {
  type Error = ClientError;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User, ClientError> {
    self.json(self.client.post(self.url("/users")).json(&input)).await
  }

  async fn list_users(&self) -> Result<Vec<User>, ClientError> {
    self.json(self.client.get(self.url("/users"))).await
  }

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn add_subject(&self, mut input: NewSubject) -> Result<Subject, ClientError> {
    input.created_by = input.created_by.or(self.config.actor);
    self.json(self.client.post(self.url("/subjects")).json(&input)).await
  }

  async fn list_subjects(&self) -> Result<Vec<SubjectSummary>, ClientError> {
    self.json(self.client.get(self.url("/subjects"))).await
  }

  async fn get_subject(&self, id: Uuid) -> Result<Option<Subject>, ClientError> {
    let req = self.client.get(self.url(&format!("/subjects/{id}")));
    match self.json(req).await {
      Ok(subject) => Ok(Some(subject)),
      Err(ClientError::Status { status, .. }) if status == StatusCode::NOT_FOUND => Ok(None),
      Err(e) => Err(e),
    }
  }

  async fn update_subject(&self, id: Uuid, mut patch: SubjectPatch) -> Result<Subject, ClientError> {
    patch.updated_by = patch.updated_by.or(self.config.actor);
    let req = self.client.patch(self.url(&format!("/subjects/{id}"))).json(&patch);
    self.json(req).await
  }

  // ── Assignment ────────────────────────────────────────────────────────────

  async fn assign_users(&self, id: Uuid, user_ids: Vec<Uuid>) -> Result<(), ClientError> {
    let req = self
      .client
      .post(self.url(&format!("/subjects/{id}/assign")))
      .json(&json!({ "user_ids": user_ids }));
    self.send(req).await?;
    Ok(())
  }

  async fn unassign_users(&self, id: Uuid, user_ids: Vec<Uuid>) -> Result<(), ClientError> {
    let req = self
      .client
      .post(self.url(&format!("/subjects/{id}/unassign")))
      .json(&json!({ "user_ids": user_ids }));
    self.send(req).await?;
    Ok(())
  }

  async fn record_completion(&self, id: Uuid, user_id: Uuid) -> Result<(), ClientError> {
    let req = self
      .client
      .post(self.url(&format!("/subjects/{id}/completions")))
      .json(&json!({ "user_id": user_id }));
    self.send(req).await?;
    Ok(())
  }

  // ── Content ───────────────────────────────────────────────────────────────

  async fn create_topic(&self, draft: TopicDraft) -> Result<Topic, ClientError> {
    self.json(self.client.post(self.url("/topics")).json(&draft)).await
  }

  async fn create_quiz(&self, draft: QuizDraft) -> Result<Quiz, ClientError> {
    self.json(self.client.post(self.url("/quizzes")).json(&draft)).await
  }
}
