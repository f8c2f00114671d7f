//! Content seeding from JSON fixtures.
//!
//! `courses.json` holds an array of courses, each with nested lessons, each
//! with nested vocabulary. Upsert mode (the default) is idempotent: courses are
//! keyed by (language, level), lessons by (course, order) and vocabulary by
//! (lesson, word). Reset mode wipes content and dependent progress first. Both
//! run in a single transaction.

use std::{
  fs,
  path::{Path, PathBuf},
};

use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;
use tracing::{info, instrument};

use crate::domain::Section;
use crate::pinyin::reading_for;

pub const COURSES_FILE: &str = "courses.json";

#[derive(Debug, Error)]
pub enum SeedError {
  #[error("cannot read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("invalid fixture {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
  #[error("database error while seeding: {0}")]
  Database(#[from] sqlx::Error),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SeedMode {
  /// Insert new content and update existing rows in place.
  #[default]
  Upsert,
  /// Delete all content (and progress that references it), then insert.
  Reset,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseFixture {
  pub language: String,
  pub level: String,
  pub title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default = "published")]
  pub is_published: bool,
  pub order: Option<i64>,
  #[serde(default)]
  pub lessons: Vec<LessonFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonFixture {
  pub title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub content: String,
  pub order: Option<i64>,
  #[serde(default)]
  pub duration: i64,
  #[serde(default = "beginner")]
  pub difficulty: String,
  #[serde(default = "published")]
  pub is_published: bool,
  #[serde(default)]
  pub vocabulary: Vec<VocabularyFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyFixture {
  pub word: String,
  #[serde(default)]
  pub reading: String,
  pub meaning: String,
  #[serde(default)]
  pub example: String,
  pub difficulty: Option<String>,
  #[serde(default)]
  pub section: Section,
  pub order: Option<i64>,
}

fn published() -> bool {
  true
}

fn beginner() -> String {
  "beginner".into()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
  pub courses: usize,
  pub lessons: usize,
  pub vocabulary: usize,
}

/// Read `<dir>/courses.json`.
pub fn load_fixtures(dir: &Path) -> Result<Vec<CourseFixture>, SeedError> {
  let path = dir.join(COURSES_FILE);
  let raw = fs::read_to_string(&path).map_err(|source| SeedError::Read { path: path.clone(), source })?;
  parse_fixtures(&raw).map_err(|source| SeedError::Parse { path, source })
}

pub fn parse_fixtures(raw: &str) -> Result<Vec<CourseFixture>, serde_json::Error> {
  serde_json::from_str(raw)
}

#[instrument(level = "info", target = "seed", skip(pool, fixtures), fields(courses = fixtures.len(), ?mode))]
pub async fn seed(pool: &SqlitePool, fixtures: &[CourseFixture], mode: SeedMode) -> Result<SeedReport, SeedError> {
  let mut tx = pool.begin().await?;

  if mode == SeedMode::Reset {
    for table in ["user_progress", "vocabulary", "lessons", "courses"] {
      let deleted = sqlx::query(&format!("DELETE FROM {table}")).execute(&mut *tx).await?;
      info!(target: "seed", table, rows = deleted.rows_affected(), "Cleared table");
    }
  }

  let mut report = SeedReport::default();
  for (ci, course) in fixtures.iter().enumerate() {
    let course_id = upsert_course(&mut tx, course, position(course.order, ci)).await?;
    report.courses += 1;

    for (li, lesson) in course.lessons.iter().enumerate() {
      let lesson_id = upsert_lesson(&mut tx, course_id, lesson, position(lesson.order, li)).await?;
      report.lessons += 1;

      for (vi, item) in lesson.vocabulary.iter().enumerate() {
        let reading = reading_for(&course.language, &item.word, &item.reading);
        let difficulty = item.difficulty.as_deref().unwrap_or(&lesson.difficulty);
        upsert_vocabulary(&mut tx, lesson_id, item, &reading, difficulty, position(item.order, vi)).await?;
        report.vocabulary += 1;
      }
    }
  }

  tx.commit().await?;
  info!(target: "seed", courses = report.courses, lessons = report.lessons, vocabulary = report.vocabulary, "Seed complete");
  Ok(report)
}

/// Explicit order, or 1-based position in the fixture list.
fn position(order: Option<i64>, index: usize) -> i64 {
  order.unwrap_or(index as i64 + 1)
}

async fn upsert_course(conn: &mut SqliteConnection, c: &CourseFixture, order: i64) -> Result<i64, sqlx::Error> {
  sqlx::query_scalar(
    r#"
    INSERT INTO courses (language, level, title, description, is_published, sort_order)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT (language, level) DO UPDATE SET
      title        = excluded.title,
      description  = excluded.description,
      is_published = excluded.is_published,
      sort_order   = excluded.sort_order
    RETURNING id
    "#,
  )
  .bind(c.language.trim().to_lowercase())
  .bind(c.level.trim())
  .bind(&c.title)
  .bind(&c.description)
  .bind(c.is_published)
  .bind(order)
  .fetch_one(conn)
  .await
}

async fn upsert_lesson(
  conn: &mut SqliteConnection,
  course_id: i64,
  l: &LessonFixture,
  order: i64,
) -> Result<i64, sqlx::Error> {
  sqlx::query_scalar(
    r#"
    INSERT INTO lessons (course_id, title, description, content, sort_order, duration, difficulty, is_published)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT (course_id, sort_order) DO UPDATE SET
      title        = excluded.title,
      description  = excluded.description,
      content      = excluded.content,
      duration     = excluded.duration,
      difficulty   = excluded.difficulty,
      is_published = excluded.is_published
    RETURNING id
    "#,
  )
  .bind(course_id)
  .bind(&l.title)
  .bind(&l.description)
  .bind(&l.content)
  .bind(order)
  .bind(l.duration)
  .bind(&l.difficulty)
  .bind(l.is_published)
  .fetch_one(conn)
  .await
}

async fn upsert_vocabulary(
  conn: &mut SqliteConnection,
  lesson_id: i64,
  v: &VocabularyFixture,
  reading: &str,
  difficulty: &str,
  order: i64,
) -> Result<(), sqlx::Error> {
  sqlx::query(
    r#"
    INSERT INTO vocabulary (lesson_id, word, reading, meaning, example, difficulty, section, sort_order)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT (lesson_id, word) DO UPDATE SET
      reading    = excluded.reading,
      meaning    = excluded.meaning,
      example    = excluded.example,
      difficulty = excluded.difficulty,
      section    = excluded.section,
      sort_order = excluded.sort_order
    "#,
  )
  .bind(lesson_id)
  .bind(&v.word)
  .bind(reading)
  .bind(&v.meaning)
  .bind(&v.example)
  .bind(difficulty)
  .bind(v.section.as_str())
  .bind(order)
  .execute(conn)
  .await?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::{test_pool, vocabulary};

  const FIXTURE: &str = r#"[
    {
      "language": "Chinese", "level": "HSK1", "title": "HSK 1",
      "lessons": [
        {
          "title": "Greetings", "duration": 10,
          "vocabulary": [
            { "word": "你好", "meaning": "hello" },
            { "word": "谢谢", "reading": "xièxie", "meaning": "thank you", "section": "conversation" }
          ]
        }
      ]
    }
  ]"#;

  #[test]
  fn fixtures_fill_defaults() {
    let courses = parse_fixtures(FIXTURE).unwrap();
    let lesson = &courses[0].lessons[0];
    assert!(courses[0].is_published);
    assert_eq!(lesson.difficulty, "beginner");
    assert_eq!(lesson.vocabulary[0].section, Section::Main);
    assert_eq!(lesson.vocabulary[1].section, Section::Conversation);
  }

  #[test]
  fn unknown_section_is_a_parse_error() {
    let bad = r#"[{"language":"english","level":"A1","title":"A1","lessons":[{"title":"x","vocabulary":[{"word":"a","meaning":"b","section":"grammar"}]}]}]"#;
    assert!(parse_fixtures(bad).is_err());
  }

  #[tokio::test]
  async fn chinese_readings_are_generated_when_missing() {
    let pool = test_pool().await;
    let report = seed(&pool, &parse_fixtures(FIXTURE).unwrap(), SeedMode::Upsert).await.unwrap();
    assert_eq!(report, SeedReport { courses: 1, lessons: 1, vocabulary: 2 });

    let lesson_id: i64 = sqlx::query_scalar("SELECT id FROM lessons").fetch_one(&pool).await.unwrap();
    let items = vocabulary::list_for_lesson(&pool, lesson_id, None).await.unwrap();
    assert_eq!(items[0].reading, "nǐ hǎo");
    assert_eq!(items[1].reading, "xièxie");

    let language: String = sqlx::query_scalar("SELECT language FROM courses").fetch_one(&pool).await.unwrap();
    assert_eq!(language, "chinese");
  }

  #[test]
  fn missing_directory_reports_path() {
    let err = load_fixtures(Path::new("/definitely/not/here")).unwrap_err();
    assert!(matches!(err, SeedError::Read { .. }));
    assert!(err.to_string().contains(COURSES_FILE));
  }
}
