use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::User;

/// Insert a user with an already-hashed password. A duplicate email surfaces
/// as a UNIQUE violation (see `db::is_unique_violation`).
pub async fn insert(
  pool: &SqlitePool,
  email: &str,
  name: &str,
  password_hash: &str,
) -> Result<User, sqlx::Error> {
  let user = User {
    id: Uuid::new_v4().to_string(),
    email: email.to_string(),
    name: name.to_string(),
    password_hash: password_hash.to_string(),
    created_at: Utc::now(),
  };
  sqlx::query("INSERT INTO users (id, email, name, password_hash, created_at) VALUES (?, ?, ?, ?, ?)")
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.name)
    .bind(&user.password_hash)
    .bind(user.created_at)
    .execute(pool)
    .await?;
  Ok(user)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
  sqlx::query_as::<_, User>("SELECT id, email, name, password_hash, created_at FROM users WHERE email = ?")
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
  sqlx::query_as::<_, User>("SELECT id, email, name, password_hash, created_at FROM users WHERE id = ?")
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn count_by_email(pool: &SqlitePool, email: &str) -> Result<i64, sqlx::Error> {
  sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
    .bind(email)
    .fetch_one(pool)
    .await
}
