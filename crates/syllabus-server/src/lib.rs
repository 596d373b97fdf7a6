//! HTTP server for Syllabus.
//!
//! Mounts the JSON API from `syllabus-api` under `/api` and adds request
//! tracing and a body size limit.

pub mod seed;

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use serde::Deserialize;
use syllabus_core::store::SubjectStore;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Largest request body accepted by the API.
pub const BODY_LIMIT: usize = 1024 * 1024;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SYLLABUS_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 5240 }

fn default_store_path() -> PathBuf { PathBuf::from("syllabus.db") }

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router for `store`.
pub fn router<S>(store: Arc<S>) -> Router
where
  S: SubjectStore + 'static,
{
  Router::new()
    .nest("/api", syllabus_api::api_router(store))
    .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use syllabus_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  async fn app() -> Router {
    router(Arc::new(SqliteStore::open_in_memory().await.unwrap()))
  }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let app = app().await;
    let res = app
      .clone()
      .oneshot(Request::get("/api/subjects").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
      .oneshot(Request::get("/subjects").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn oversized_bodies_are_rejected() {
    let app = app().await;
    let body = format!(r#"{{"full_name":"{}","email":"x@example.com"}}"#, "x".repeat(BODY_LIMIT));
    let res = app
      .oneshot(
        Request::post("/api/users")
          .header("content-type", "application/json")
          .header("content-length", body.len())
          .body(Body::from(body))
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
  }

  #[test]
  fn config_defaults_apply() {
    let cfg: ServerConfig = config::Config::builder()
      .set_override("port", 8080)
      .unwrap()
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.store_path, PathBuf::from("syllabus.db"));
  }
}
