//! SQLite content store: connection pool, idempotent schema creation and the
//! per-table query modules.

use std::{str::FromStr, time::Duration};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{info, instrument};

pub mod courses;
pub mod lessons;
pub mod progress;
pub mod users;
pub mod vocabulary;

const SCHEMA: &[&str] = &[
  r#"
  CREATE TABLE IF NOT EXISTS courses (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    language     TEXT    NOT NULL,
    level        TEXT    NOT NULL,
    title        TEXT    NOT NULL,
    description  TEXT    NOT NULL DEFAULT '',
    is_published BOOLEAN NOT NULL DEFAULT 1,
    sort_order   INTEGER NOT NULL DEFAULT 0,
    UNIQUE (language, level)
  )
  "#,
  r#"
  CREATE TABLE IF NOT EXISTS lessons (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    course_id    INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
    title        TEXT    NOT NULL,
    description  TEXT    NOT NULL DEFAULT '',
    content      TEXT    NOT NULL DEFAULT '',
    sort_order   INTEGER NOT NULL,
    duration     INTEGER NOT NULL DEFAULT 0,
    difficulty   TEXT    NOT NULL DEFAULT 'beginner',
    is_published BOOLEAN NOT NULL DEFAULT 1,
    UNIQUE (course_id, sort_order)
  )
  "#,
  r#"
  CREATE TABLE IF NOT EXISTS vocabulary (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    lesson_id  INTEGER NOT NULL REFERENCES lessons(id) ON DELETE CASCADE,
    word       TEXT    NOT NULL,
    reading    TEXT    NOT NULL DEFAULT '',
    meaning    TEXT    NOT NULL,
    example    TEXT    NOT NULL DEFAULT '',
    difficulty TEXT    NOT NULL DEFAULT 'beginner',
    section    TEXT    NOT NULL DEFAULT 'main' CHECK (section IN ('main', 'conversation', 'reading')),
    sort_order INTEGER NOT NULL DEFAULT 0,
    UNIQUE (lesson_id, word)
  )
  "#,
  r#"
  CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    name          TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL
  )
  "#,
  r#"
  CREATE TABLE IF NOT EXISTS user_progress (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id      TEXT    NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    lesson_id    INTEGER NOT NULL REFERENCES lessons(id) ON DELETE CASCADE,
    is_completed BOOLEAN NOT NULL DEFAULT 0,
    completed_at TEXT,
    updated_at   TEXT    NOT NULL,
    UNIQUE (user_id, lesson_id)
  )
  "#,
  "CREATE INDEX IF NOT EXISTS idx_lessons_course ON lessons(course_id, sort_order)",
  "CREATE INDEX IF NOT EXISTS idx_vocabulary_lesson ON vocabulary(lesson_id, sort_order)",
  "CREATE INDEX IF NOT EXISTS idx_progress_user ON user_progress(user_id)",
];

/// Open a pool for `url` (e.g. `sqlite:lingua.db?mode=rwc`), creating the file if needed.
#[instrument(level = "info", skip_all)]
pub async fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
  let options = SqliteConnectOptions::from_str(url)?
    .create_if_missing(true)
    .foreign_keys(true)
    .busy_timeout(Duration::from_secs(30));

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect_with(options)
    .await?;
  info!(target: "lingua_backend", "SQLite pool ready");
  Ok(pool)
}

/// Private in-memory database. A single connection that never expires, since
/// every new `:memory:` connection would be a fresh, empty database.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
  let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
  SqlitePoolOptions::new()
    .max_connections(1)
    .min_connections(1)
    .idle_timeout(None)
    .max_lifetime(None)
    .connect_with(options)
    .await
}

/// Create tables and indexes if they do not exist yet.
#[instrument(level = "info", skip_all)]
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
  for stmt in SCHEMA {
    sqlx::query(stmt).execute(pool).await?;
  }
  info!(target: "lingua_backend", statements = SCHEMA.len(), "Schema up to date");
  Ok(())
}

pub async fn ping(pool: &SqlitePool) -> bool {
  sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await.is_ok()
}

/// True when `err` is a UNIQUE constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
  err.as_database_error().map(|e| e.is_unique_violation()).unwrap_or(false)
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
  let pool = connect_in_memory().await.unwrap();
  migrate(&pool).await.unwrap();
  pool
}
