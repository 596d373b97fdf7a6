//! Position allocation and unsaved topic/quiz records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{OperationError, Result};

/// Position for an item appended to a merged sequence of `merged_len` entries.
///
/// Only valid when `merged_len` comes from the latest refetched subject; two
/// creations from the same stale length collide.
pub fn next_position(merged_len: usize) -> u32 {
  u32::try_from(merged_len).unwrap_or(u32::MAX)
}

/// Input to [`crate::store::SubjectStore::create_topic`]. The identifier is
/// assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDraft {
  pub subject_id: Uuid,
  pub title:      String,
  pub position:   u32,
}

/// Input to [`crate::store::SubjectStore::create_quiz`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDraft {
  pub subject_id: Uuid,
  pub title:      String,
  pub position:   u32,
}

/// Trim `title`, rejecting it when nothing is left.
pub fn validate_title(title: &str) -> Result<String> {
  let trimmed = title.trim();
  if trimmed.is_empty() {
    return Err(OperationError::validation("title must not be empty"));
  }
  Ok(trimmed.to_owned())
}

pub fn new_topic(subject_id: Uuid, position: u32, title: &str) -> Result<TopicDraft> {
  Ok(TopicDraft { subject_id, title: validate_title(title)?, position })
}

pub fn new_quiz(subject_id: Uuid, position: u32, title: &str) -> Result<QuizDraft> {
  Ok(QuizDraft { subject_id, title: validate_title(title)?, position })
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;
  use crate::ErrorKind;

  #[test]
  fn drafts_carry_trimmed_title_and_position() {
    let id = Uuid::new_v4();
    let draft = new_quiz(id, 3, "  Midterm ").unwrap();
    assert_eq!(draft, QuizDraft { subject_id: id, title: "Midterm".into(), position: 3 });

    let draft = new_topic(id, 0, "Intro").unwrap();
    assert_eq!(draft.title, "Intro");
    assert_eq!(draft.position, 0);
  }

  #[test]
  fn blank_titles_are_rejected() {
    for title in ["", "   ", "\t\n"] {
      let err = new_topic(Uuid::nil(), 0, title).unwrap_err();
      assert_eq!(err.kind, ErrorKind::ValidationFailed);
      let err = new_quiz(Uuid::nil(), 0, title).unwrap_err();
      assert_eq!(err.kind, ErrorKind::ValidationFailed);
    }
  }

  #[test]
  fn position_saturates_beyond_u32() {
    if usize::BITS > 32 {
      assert_eq!(next_position(u32::MAX as usize + 1), u32::MAX);
    }
  }

  proptest! {
    #[test]
    fn next_position_appends(n in 0usize..=u32::MAX as usize) {
      prop_assert_eq!(next_position(n) as usize, n);
    }
  }
}
