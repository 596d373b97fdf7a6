//! In-memory [`SubjectStore`] for coordinator and autosave tests.
//!
//! Fetches can be held back with [`MockStore::gate_fetch`] so tests decide the
//! order in which responses land. A held fetch returns the subject as it was
//! when the request arrived, like a real server would.

use std::{
  collections::VecDeque,
  sync::{Mutex, MutexGuard},
};

use chrono::Utc;
use tokio::sync::{oneshot, watch};
use uuid::Uuid;

use crate::{
  OperationError,
  content::{Quiz, Topic},
  draft::{QuizDraft, TopicDraft},
  store::SubjectStore,
  subject::{NewSubject, Subject, SubjectPatch, SubjectSummary, SubjectType},
  user::{NewUser, User},
};

pub struct MockStore {
  subject:     Mutex<Subject>,
  users:       Vec<User>,
  calls:       Mutex<Vec<&'static str>>,
  fetch_gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
  fetch_fail:  Mutex<Option<OperationError>>,
  fetches:     watch::Sender<usize>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> { m.lock().unwrap() }

impl MockStore {
  /// A subject titled "Onboarding" with topics at 0 and 2, a quiz at 1, and
  /// two known users, neither assigned.
  pub fn new() -> Self {
    let subject_id = Uuid::new_v4();
    let now = Utc::now();
    let topic = |title: &str, position| Topic {
      topic_id: Uuid::new_v4(),
      subject_id,
      title: title.into(),
      position,
    };
    let subject = Subject {
      subject_id,
      title: "Onboarding".into(),
      description: "First week at the company".into(),
      subject_type: SubjectType::Company,
      is_published: false,
      created_by: None,
      created_at: now,
      last_updated_by: None,
      last_updated_at: now,
      users_assigned: Vec::new(),
      completion_rate: None,
      topics: vec![topic("Welcome", 0), topic("Tooling", 2)],
      quizzes: vec![Quiz {
        quiz_id: Uuid::new_v4(),
        subject_id,
        title: "Welcome check".into(),
        position: 1,
      }],
    };
    let users = ["Ada Lovelace", "Grace Hopper"]
      .into_iter()
      .map(|name| User {
        user_id:   Uuid::new_v4(),
        full_name: name.into(),
        email:     format!("{}@example.com", name.split(' ').next().unwrap_or("user")),
      })
      .collect();

    Self {
      subject: Mutex::new(subject),
      users,
      calls: Mutex::new(Vec::new()),
      fetch_gates: Mutex::new(VecDeque::new()),
      fetch_fail: Mutex::new(None),
      fetches: watch::Sender::new(0),
    }
  }

  pub fn subject_id(&self) -> Uuid { lock(&self.subject).subject_id }

  /// The server-side subject, regardless of what any client has fetched.
  pub fn server_subject(&self) -> Subject { lock(&self.subject).clone() }

  pub fn user(&self, index: usize) -> User { self.users[index].clone() }

  pub fn calls(&self) -> Vec<&'static str> { lock(&self.calls).clone() }

  /// Hold back the next not-yet-gated fetch until the returned sender fires.
  pub fn gate_fetch(&self) -> oneshot::Sender<()> {
    let (tx, rx) = oneshot::channel();
    lock(&self.fetch_gates).push_back(rx);
    tx
  }

  pub fn fail_next_fetch(&self, err: OperationError) { *lock(&self.fetch_fail) = Some(err); }

  /// Resolve once `n` fetches have been received (not necessarily answered).
  pub async fn wait_fetches(&self, n: usize) {
    let mut rx = self.fetches.subscribe();
    let _ = rx.wait_for(|count| *count >= n).await;
  }

  fn record(&self, call: &'static str) { lock(&self.calls).push(call); }

  fn touch(subject: &mut Subject) { subject.last_updated_at = Utc::now(); }
}

impl SubjectStore for MockStore {
  type Error = OperationError;

  async fn add_user(&self, _: NewUser) -> Result<User, Self::Error> { unimplemented!() }

  async fn list_users(&self) -> Result<Vec<User>, Self::Error> {
    self.record("list_users");
    Ok(self.users.clone())
  }

  async fn add_subject(&self, _: NewSubject) -> Result<Subject, Self::Error> { unimplemented!() }

  async fn list_subjects(&self) -> Result<Vec<SubjectSummary>, Self::Error> { unimplemented!() }

  async fn get_subject(&self, id: Uuid) -> Result<Option<Subject>, Self::Error> {
    self.record("get_subject");
    let current = lock(&self.subject).clone();
    let gate = lock(&self.fetch_gates).pop_front();
    let failure = lock(&self.fetch_fail).take();
    self.fetches.send_modify(|count| *count += 1);

    if let Some(gate) = gate {
      let _ = gate.await;
    }
    if let Some(err) = failure {
      return Err(err);
    }
    Ok((current.subject_id == id).then_some(current))
  }

  async fn update_subject(&self, id: Uuid, patch: SubjectPatch) -> Result<Subject, Self::Error> {
    self.record("update_subject");
    let mut subject = lock(&self.subject);
    if subject.subject_id != id {
      return Err(OperationError::not_found("no such subject"));
    }
    if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
      return Err(OperationError::validation("title must not be empty"));
    }
    if let Some(title) = patch.title {
      subject.title = title;
    }
    if let Some(description) = patch.description {
      subject.description = description;
    }
    if let Some(is_published) = patch.is_published {
      subject.is_published = is_published;
    }
    Self::touch(&mut subject);
    Ok(subject.clone())
  }

  async fn assign_users(&self, _: Uuid, user_ids: Vec<Uuid>) -> Result<(), Self::Error> {
    self.record("assign_users");
    let mut subject = lock(&self.subject);
    for user in self.users.iter().filter(|u| user_ids.contains(&u.user_id)) {
      if !subject.is_assigned(user.user_id) {
        subject.users_assigned.push(user.clone());
      }
    }
    Self::touch(&mut subject);
    Ok(())
  }

  async fn unassign_users(&self, _: Uuid, user_ids: Vec<Uuid>) -> Result<(), Self::Error> {
    self.record("unassign_users");
    let mut subject = lock(&self.subject);
    subject.users_assigned.retain(|u| !user_ids.contains(&u.user_id));
    Self::touch(&mut subject);
    Ok(())
  }

  async fn record_completion(&self, _: Uuid, _: Uuid) -> Result<(), Self::Error> {
    unimplemented!()
  }

  async fn create_topic(&self, draft: TopicDraft) -> Result<Topic, Self::Error> {
    self.record("create_topic");
    let topic = Topic {
      topic_id:   Uuid::new_v4(),
      subject_id: draft.subject_id,
      title:      draft.title,
      position:   draft.position,
    };
    lock(&self.subject).topics.push(topic.clone());
    Ok(topic)
  }

  async fn create_quiz(&self, draft: QuizDraft) -> Result<Quiz, Self::Error> {
    self.record("create_quiz");
    let quiz = Quiz {
      quiz_id:    Uuid::new_v4(),
      subject_id: draft.subject_id,
      title:      draft.title,
      position:   draft.position,
    };
    lock(&self.subject).quizzes.push(quiz.clone());
    Ok(quiz)
  }
}
