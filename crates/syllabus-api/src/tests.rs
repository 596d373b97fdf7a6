use std::sync::Arc;

use axum::{
  Router,
  body::{Body, to_bytes},
  http::{Method, Request, StatusCode},
};
use serde_json::{Value, json};
use syllabus_store_sqlite::SqliteStore;
use tower::ServiceExt as _;

use crate::api_router;

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  api_router(Arc::new(store))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let mut req = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      req = req.header("content-type", "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let res = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
  let status = res.status();
  let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, json)
}

async fn create_subject(app: &Router, title: &str) -> Value {
  let (status, subject) = send(
    app,
    Method::POST,
    "/subjects",
    Some(json!({ "title": title, "subject_type": "PROCESS" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  subject
}

async fn create_user(app: &Router, name: &str, email: &str) -> Value {
  let (status, user) =
    send(app, Method::POST, "/users", Some(json!({ "full_name": name, "email": email }))).await;
  assert_eq!(status, StatusCode::CREATED);
  user
}

#[tokio::test]
async fn subject_lifecycle_over_http() {
  let app = app().await;
  let subject = create_subject(&app, "Expense claims").await;
  let id = subject["subject_id"].as_str().unwrap().to_owned();
  assert_eq!(subject["subject_type"], "PROCESS");
  assert_eq!(subject["is_published"], false);
  assert_eq!(subject["completion_rate"], Value::Null);

  let (status, patched) = send(
    &app,
    Method::PATCH,
    &format!("/subjects/{id}"),
    Some(json!({ "description": "Receipts within 30 days", "is_published": true })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(patched["description"], "Receipts within 30 days");
  assert_eq!(patched["title"], "Expense claims");

  let (status, fetched) = send(&app, Method::GET, &format!("/subjects/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched, patched);

  let (status, list) = send(&app, Method::GET, "/subjects?published=true", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(list.as_array().unwrap().len(), 1);
  let (_, list) = send(&app, Method::GET, "/subjects?subject_type=COMPANY", None).await;
  assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_subject_is_404_with_kind() {
  let app = app().await;
  let uri = format!("/subjects/{}", uuid::Uuid::new_v4());

  let (status, body) = send(&app, Method::GET, &uri, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["kind"], "NotFound");

  let (status, body) =
    send(&app, Method::PATCH, &uri, Some(json!({ "is_published": true }))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["kind"], "NotFound");
}

#[tokio::test]
async fn blank_title_is_422() {
  let app = app().await;
  let subject = create_subject(&app, "Security").await;
  let id = subject["subject_id"].as_str().unwrap();

  let (status, body) =
    send(&app, Method::PATCH, &format!("/subjects/{id}"), Some(json!({ "title": "  " }))).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["kind"], "ValidationFailed");

  let (status, body) = send(
    &app,
    Method::POST,
    "/topics",
    Some(json!({ "subject_id": id, "title": "", "position": 0 })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["kind"], "ValidationFailed");
}

#[tokio::test]
async fn assignment_and_completion_drive_the_rate() {
  let app = app().await;
  let subject = create_subject(&app, "Security").await;
  let id = subject["subject_id"].as_str().unwrap().to_owned();
  let ada = create_user(&app, "Ada Lovelace", "ada@example.com").await;
  let grace = create_user(&app, "Grace Hopper", "grace@example.com").await;

  let (status, _) = send(
    &app,
    Method::POST,
    &format!("/subjects/{id}/assign"),
    Some(json!({ "user_ids": [ada["user_id"], grace["user_id"]] })),
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) = send(
    &app,
    Method::POST,
    &format!("/subjects/{id}/completions"),
    Some(json!({ "user_id": grace["user_id"] })),
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  send(&app, Method::PATCH, &format!("/subjects/{id}"), Some(json!({ "is_published": true })))
    .await;
  let (_, fetched) = send(&app, Method::GET, &format!("/subjects/{id}"), None).await;
  assert_eq!(fetched["users_assigned"].as_array().unwrap().len(), 2);
  assert_eq!(fetched["completion_rate"], 0.5);

  let (status, _) = send(
    &app,
    Method::POST,
    &format!("/subjects/{id}/unassign"),
    Some(json!({ "user_ids": [ada["user_id"]] })),
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (_, fetched) = send(&app, Method::GET, &format!("/subjects/{id}"), None).await;
  assert_eq!(fetched["users_assigned"], json!([grace]));
  assert_eq!(fetched["completion_rate"], 1.0);

  let (_, users) = send(&app, Method::GET, "/users", None).await;
  assert_eq!(users, json!([ada, grace]));
}

#[tokio::test]
async fn content_is_created_at_the_given_position() {
  let app = app().await;
  let subject = create_subject(&app, "Security").await;
  let id = subject["subject_id"].as_str().unwrap().to_owned();

  let (status, topic) = send(
    &app,
    Method::POST,
    "/topics",
    Some(json!({ "subject_id": id, "title": "Badges", "position": 0 })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(topic["position"], 0);

  let (status, quiz) = send(
    &app,
    Method::POST,
    "/quizzes",
    Some(json!({ "subject_id": id, "title": "Badge quiz", "position": 1 })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (_, fetched) = send(&app, Method::GET, &format!("/subjects/{id}"), None).await;
  assert_eq!(fetched["topics"], json!([topic]));
  assert_eq!(fetched["quizzes"], json!([quiz]));
}

#[tokio::test]
async fn duplicate_email_is_unprocessable() {
  let app = app().await;
  create_user(&app, "Ada Lovelace", "ada@example.com").await;

  let (status, body) = send(
    &app,
    Method::POST,
    "/users",
    Some(json!({ "full_name": "Ada King", "email": "ada@example.com" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["kind"], "ValidationFailed");
  assert!(body["error"].as_str().unwrap().contains("email"));
}
