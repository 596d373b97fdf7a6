//! Demo data for a fresh store.

use syllabus_core::{
  OperationError, Result,
  content::{self, ContentEntry},
  draft,
  store::SubjectStore,
  subject::{NewSubject, SubjectPatch, SubjectType},
  user::NewUser,
};

enum Item {
  Topic(&'static str),
  Quiz(&'static str),
}

const PEOPLE: &[(&str, &str)] = &[
  ("Ada Lovelace", "ada@example.com"),
  ("Grace Hopper", "grace@example.com"),
  ("Alan Turing", "alan@example.com"),
];

const ONBOARDING: &[Item] = &[
  Item::Topic("Welcome"),
  Item::Topic("Tooling and accounts"),
  Item::Quiz("First day check"),
  Item::Topic("Who to ask"),
];

const SECURITY: &[Item] = &[
  Item::Topic("Passwords"),
  Item::Quiz("Password quiz"),
  Item::Topic("Badges and visitors"),
];

fn op<E: Into<OperationError>>(e: E) -> OperationError { e.into() }

/// Populate an empty store with a few users and two subjects. Returns `false`
/// and leaves the store untouched if it already holds any subject.
pub async fn seed<S: SubjectStore>(store: &S) -> Result<bool> {
  if !store.list_subjects().await.map_err(op)?.is_empty() {
    return Ok(false);
  }

  let mut users = Vec::with_capacity(PEOPLE.len());
  for (name, email) in PEOPLE {
    let user = store
      .add_user(NewUser { full_name: (*name).into(), email: (*email).into() })
      .await
      .map_err(op)?;
    users.push(user);
  }
  let author = users.first().map(|u| u.user_id);
  let everyone: Vec<_> = users.iter().map(|u| u.user_id).collect();

  let onboarding = subject(store, "Onboarding", SubjectType::Company, author, ONBOARDING).await?;
  store.assign_users(onboarding, everyone.clone()).await.map_err(op)?;
  store
    .update_subject(onboarding, SubjectPatch { updated_by: author, ..SubjectPatch::published(true) })
    .await
    .map_err(op)?;
  store.record_completion(onboarding, everyone[0]).await.map_err(op)?;

  let security = subject(store, "Security basics", SubjectType::Policy, author, SECURITY).await?;
  store.assign_users(security, everyone[1..].to_vec()).await.map_err(op)?;

  tracing::info!(users = users.len(), "seeded demo data");
  Ok(true)
}

async fn subject<S: SubjectStore>(
  store: &S,
  title: &str,
  subject_type: SubjectType,
  created_by: Option<uuid::Uuid>,
  items: &[Item],
) -> Result<uuid::Uuid> {
  let subject = store
    .add_subject(NewSubject {
      title: title.into(),
      description: format!("{title} for every new starter"),
      subject_type,
      created_by,
    })
    .await
    .map_err(op)?;
  let id = subject.subject_id;

  let mut merged: Vec<ContentEntry> = content::merge(&subject.topics, &subject.quizzes);
  for item in items {
    let position = draft::next_position(merged.len());
    let entry = match item {
      Item::Topic(t) => {
        let d = draft::new_topic(id, position, t)?;
        ContentEntry::Topic(store.create_topic(d).await.map_err(op)?)
      }
      Item::Quiz(t) => {
        let d = draft::new_quiz(id, position, t)?;
        ContentEntry::Quiz(store.create_quiz(d).await.map_err(op)?)
      }
    };
    merged.push(entry);
  }
  Ok(id)
}
