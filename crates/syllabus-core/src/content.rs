//! Topics, quizzes, and the merged curriculum sequence.
//!
//! A subject stores topics and quizzes in two separate collections, but the
//! curriculum is a single sequence ordered by `position`. Positions are unique
//! across both collections of a subject; [`merge`] tolerates duplicates by
//! keeping input order and [`duplicate_positions`] reports them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reading section of a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
  pub topic_id:   Uuid,
  pub subject_id: Uuid,
  pub title:      String,
  pub position:   u32,
}

/// An assessment section of a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
  pub quiz_id:    Uuid,
  pub subject_id: Uuid,
  pub title:      String,
  pub position:   u32,
}

/// Which collection a [`ContentEntry`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
  Topic,
  Quiz,
}

/// One element of the merged sequence, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "item", rename_all = "lowercase")]
pub enum ContentEntry {
  Topic(Topic),
  Quiz(Quiz),
}

impl ContentEntry {
  pub fn kind(&self) -> ContentKind {
    match self {
      Self::Topic(_) => ContentKind::Topic,
      Self::Quiz(_) => ContentKind::Quiz,
    }
  }

  pub fn position(&self) -> u32 {
    match self {
      Self::Topic(t) => t.position,
      Self::Quiz(q) => q.position,
    }
  }

  pub fn title(&self) -> &str {
    match self {
      Self::Topic(t) => &t.title,
      Self::Quiz(q) => &q.title,
    }
  }

  pub fn id(&self) -> Uuid {
    match self {
      Self::Topic(t) => t.topic_id,
      Self::Quiz(q) => q.quiz_id,
    }
  }
}

/// Interleave topics and quizzes into one sequence ordered by position.
///
/// The sort is stable: on equal positions topics precede quizzes and each
/// collection keeps its own relative order.
pub fn merge(topics: &[Topic], quizzes: &[Quiz]) -> Vec<ContentEntry> {
  let mut merged: Vec<ContentEntry> = topics
    .iter()
    .cloned()
    .map(ContentEntry::Topic)
    .chain(quizzes.iter().cloned().map(ContentEntry::Quiz))
    .collect();
  merged.sort_by_key(ContentEntry::position);
  merged
}

/// Separate a merged sequence back into its two collections, preserving order.
pub fn split(entries: &[ContentEntry]) -> (Vec<Topic>, Vec<Quiz>) {
  let mut topics = Vec::new();
  let mut quizzes = Vec::new();
  for entry in entries {
    match entry {
      ContentEntry::Topic(t) => topics.push(t.clone()),
      ContentEntry::Quiz(q) => quizzes.push(q.clone()),
    }
  }
  (topics, quizzes)
}

/// Positions held by more than one entry of a merged (sorted) sequence.
pub fn duplicate_positions(entries: &[ContentEntry]) -> Vec<u32> {
  let mut dupes: Vec<u32> = entries
    .windows(2)
    .filter(|w| w[0].position() == w[1].position())
    .map(|w| w[0].position())
    .collect();
  dupes.dedup();
  dupes
}
