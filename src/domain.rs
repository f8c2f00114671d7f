//! Domain models stored in the relational content store: courses, lessons,
//! vocabulary, users and per-lesson progress.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

/// A (language, level) pair of instructional content.
#[derive(Clone, Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
  pub id: i64,
  pub language: String,
  pub level: String,
  pub title: String,
  pub description: String,
  pub is_published: bool,
  #[sqlx(rename = "sort_order")]
  pub order: i64,
  /// Published lessons only.
  pub lesson_count: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
  pub id: i64,
  pub course_id: i64,
  pub title: String,
  pub description: String,
  pub content: String,
  #[sqlx(rename = "sort_order")]
  pub order: i64,
  /// Minutes.
  pub duration: i64,
  pub difficulty: String,
  pub is_published: bool,
}

/// Lesson row without its content body, for course pages.
#[derive(Clone, Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LessonSummary {
  pub id: i64,
  pub title: String,
  pub description: String,
  #[sqlx(rename = "sort_order")]
  pub order: i64,
  pub duration: i64,
  pub difficulty: String,
}

/// Which part of a lesson a vocabulary entry belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
  #[default]
  Main,
  Conversation,
  Reading,
}

impl Section {
  pub fn as_str(&self) -> &'static str {
    match self {
      Section::Main => "main",
      Section::Conversation => "conversation",
      Section::Reading => "reading",
    }
  }
}

impl fmt::Display for Section {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Error)]
#[error("Unknown vocabulary section '{0}'")]
pub struct UnknownSection(pub String);

impl FromStr for Section {
  type Err = UnknownSection;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "main" => Ok(Section::Main),
      "conversation" => Ok(Section::Conversation),
      "reading" => Ok(Section::Reading),
      other => Err(UnknownSection(other.to_string())),
    }
  }
}

impl TryFrom<String> for Section {
  type Error = UnknownSection;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

#[derive(Clone, Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Vocabulary {
  pub id: i64,
  pub lesson_id: i64,
  pub word: String,
  pub reading: String,
  pub meaning: String,
  pub example: String,
  pub difficulty: String,
  #[sqlx(try_from = "String")]
  pub section: Section,
  #[sqlx(rename = "sort_order")]
  pub order: i64,
}

/// Dictionary search hit: a vocabulary entry with where it is taught.
#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryEntry {
  pub id: i64,
  pub word: String,
  pub reading: String,
  pub meaning: String,
  pub example: String,
  pub lesson_id: i64,
  pub lesson_title: String,
  pub language: String,
  pub level: String,
}

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: String,
  pub email: String,
  pub name: String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
  pub user_id: String,
  pub lesson_id: i64,
  pub is_completed: bool,
  pub completed_at: Option<DateTime<Utc>>,
  pub updated_at: DateTime<Utc>,
}

/// Per-course completion for one user.
#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
  pub course_id: i64,
  pub language: String,
  pub level: String,
  pub title: String,
  pub total_lessons: i64,
  pub completed_lessons: i64,
  #[sqlx(skip)]
  pub percentage: f64,
}

/// `100 * completed / total`, or 0 for an empty course.
pub fn completion_percentage(completed: i64, total: i64) -> f64 {
  if total <= 0 {
    0.0
  } else {
    100.0 * completed as f64 / total as f64
  }
}
