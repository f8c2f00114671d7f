use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::{completion_percentage, CourseProgress, UserProgress};

/// Insert or update the (user, lesson) row. Completing stamps `completed_at`
/// with `now`; un-completing clears it.
pub async fn upsert(
  pool: &SqlitePool,
  user_id: &str,
  lesson_id: i64,
  is_completed: bool,
  now: DateTime<Utc>,
) -> Result<UserProgress, sqlx::Error> {
  let completed_at = is_completed.then_some(now);
  sqlx::query(
    r#"
    INSERT INTO user_progress (user_id, lesson_id, is_completed, completed_at, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT (user_id, lesson_id) DO UPDATE SET
      is_completed = excluded.is_completed,
      completed_at = excluded.completed_at,
      updated_at   = excluded.updated_at
    "#,
  )
  .bind(user_id)
  .bind(lesson_id)
  .bind(is_completed)
  .bind(completed_at)
  .bind(now)
  .execute(pool)
  .await?;

  Ok(UserProgress {
    user_id: user_id.to_string(),
    lesson_id,
    is_completed,
    completed_at,
    updated_at: now,
  })
}

pub async fn find(pool: &SqlitePool, user_id: &str, lesson_id: i64) -> Result<Option<UserProgress>, sqlx::Error> {
  sqlx::query_as::<_, UserProgress>(
    "SELECT user_id, lesson_id, is_completed, completed_at, updated_at FROM user_progress WHERE user_id = ? AND lesson_id = ?",
  )
  .bind(user_id)
  .bind(lesson_id)
  .fetch_optional(pool)
  .await
}

/// Completion per course the user has touched, grouped by course.
pub async fn course_completion(pool: &SqlitePool, user_id: &str) -> Result<Vec<CourseProgress>, sqlx::Error> {
  let mut rows = sqlx::query_as::<_, CourseProgress>(
    r#"
    SELECT c.id AS course_id, c.language, c.level, c.title,
           (SELECT COUNT(*) FROM lessons t WHERE t.course_id = c.id AND t.is_published = 1) AS total_lessons,
           COALESCE(SUM(CASE WHEN up.is_completed = 1 THEN 1 ELSE 0 END), 0) AS completed_lessons
    FROM user_progress up
    JOIN lessons l ON l.id = up.lesson_id AND l.is_published = 1
    JOIN courses c ON c.id = l.course_id AND c.is_published = 1
    WHERE up.user_id = ?
    GROUP BY c.id
    ORDER BY c.language, c.sort_order
    "#,
  )
  .bind(user_id)
  .fetch_all(pool)
  .await?;

  for row in &mut rows {
    row.percentage = completion_percentage(row.completed_lessons, row.total_lessons);
  }
  Ok(rows)
}

/// Completion timestamps of every completed lesson, oldest first.
pub async fn completion_times(pool: &SqlitePool, user_id: &str) -> Result<Vec<DateTime<Utc>>, sqlx::Error> {
  sqlx::query_scalar(
    r#"
    SELECT completed_at FROM user_progress
    WHERE user_id = ? AND is_completed = 1 AND completed_at IS NOT NULL
    ORDER BY completed_at
    "#,
  )
  .bind(user_id)
  .fetch_all(pool)
  .await
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::{test_pool, users};

  async fn course_with_lessons(pool: &SqlitePool, lessons: i64) -> Vec<i64> {
    let course = sqlx::query("INSERT INTO courses (language, level, title) VALUES ('korean', 'TOPIK1', 'Korean 1')")
      .execute(pool)
      .await
      .unwrap()
      .last_insert_rowid();
    let mut ids = Vec::new();
    for order in 1..=lessons {
      ids.push(
        sqlx::query("INSERT INTO lessons (course_id, title, sort_order) VALUES (?, 'l', ?)")
          .bind(course)
          .bind(order)
          .execute(pool)
          .await
          .unwrap()
          .last_insert_rowid(),
      );
    }
    ids
  }

  #[tokio::test]
  async fn completing_then_uncompleting_clears_timestamp() {
    let pool = test_pool().await;
    let lessons = course_with_lessons(&pool, 1).await;
    let user = users::insert(&pool, "a@example.com", "A", "h").await.unwrap();

    upsert(&pool, &user.id, lessons[0], true, Utc::now()).await.unwrap();
    let row = find(&pool, &user.id, lessons[0]).await.unwrap().unwrap();
    assert!(row.is_completed);
    assert!(row.completed_at.is_some());

    upsert(&pool, &user.id, lessons[0], false, Utc::now()).await.unwrap();
    let row = find(&pool, &user.id, lessons[0]).await.unwrap().unwrap();
    assert!(!row.is_completed);
    assert!(row.completed_at.is_none());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_progress").fetch_one(&pool).await.unwrap();
    assert_eq!(count, 1);
  }

  #[tokio::test]
  async fn course_percentage_is_completed_over_total() {
    let pool = test_pool().await;
    let lessons = course_with_lessons(&pool, 4).await;
    let user = users::insert(&pool, "b@example.com", "B", "h").await.unwrap();

    upsert(&pool, &user.id, lessons[0], true, Utc::now()).await.unwrap();
    upsert(&pool, &user.id, lessons[1], true, Utc::now()).await.unwrap();
    upsert(&pool, &user.id, lessons[2], false, Utc::now()).await.unwrap();

    let rows = course_completion(&pool, &user.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].total_lessons, 4);
    assert_eq!(rows[0].completed_lessons, 2);
    assert!((rows[0].percentage - 50.0).abs() < f64::EPSILON);
    assert_eq!(completion_times(&pool, &user.id).await.unwrap().len(), 2);
  }
}
