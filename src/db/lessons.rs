use sqlx::SqlitePool;

use crate::domain::{Lesson, LessonSummary};

/// Published lessons of a course in `order`.
pub async fn list_for_course(pool: &SqlitePool, course_id: i64) -> Result<Vec<LessonSummary>, sqlx::Error> {
  sqlx::query_as::<_, LessonSummary>(
    r#"
    SELECT id, title, description, sort_order, duration, difficulty
    FROM lessons
    WHERE course_id = ? AND is_published = 1
    ORDER BY sort_order
    "#,
  )
  .bind(course_id)
  .fetch_all(pool)
  .await
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Lesson>, sqlx::Error> {
  sqlx::query_as::<_, Lesson>(
    r#"
    SELECT id, course_id, title, description, content, sort_order, duration, difficulty, is_published
    FROM lessons
    WHERE id = ? AND is_published = 1
    "#,
  )
  .bind(id)
  .fetch_optional(pool)
  .await
}

/// True for published lessons only, like every other lesson lookup.
pub async fn exists(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
  let found: Option<i64> = sqlx::query_scalar("SELECT id FROM lessons WHERE id = ? AND is_published = 1")
    .bind(id)
    .fetch_optional(pool)
    .await?;
  Ok(found.is_some())
}

/// Ids of the lessons before and after `lesson_id` in its course's ordering.
pub async fn neighbours(
  pool: &SqlitePool,
  course_id: i64,
  lesson_id: i64,
) -> Result<(Option<i64>, Option<i64>), sqlx::Error> {
  let ordered: Vec<i64> = sqlx::query_scalar(
    "SELECT id FROM lessons WHERE course_id = ? AND is_published = 1 ORDER BY sort_order",
  )
  .bind(course_id)
  .fetch_all(pool)
  .await?;
  Ok(adjacent_ids(&ordered, lesson_id))
}

pub fn adjacent_ids(ordered: &[i64], current: i64) -> (Option<i64>, Option<i64>) {
  match ordered.iter().position(|&id| id == current) {
    Some(pos) => {
      let previous = pos.checked_sub(1).map(|p| ordered[p]);
      let next = ordered.get(pos + 1).copied();
      (previous, next)
    }
    None => (None, None),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::test_pool;

  #[test]
  fn adjacent_ids_at_edges() {
    let ids = [10, 11, 12];
    assert_eq!(adjacent_ids(&ids, 10), (None, Some(11)));
    assert_eq!(adjacent_ids(&ids, 11), (Some(10), Some(12)));
    assert_eq!(adjacent_ids(&ids, 12), (Some(11), None));
    assert_eq!(adjacent_ids(&ids, 99), (None, None));
    assert_eq!(adjacent_ids(&[7], 7), (None, None));
  }

  #[tokio::test]
  async fn neighbours_use_order_not_insertion() {
    let pool = test_pool().await;
    let course = sqlx::query("INSERT INTO courses (language, level, title) VALUES ('english', 'A1', 'A1')")
      .execute(&pool)
      .await
      .unwrap()
      .last_insert_rowid();
    let mut ids = Vec::new();
    for order in [3, 1, 2] {
      let id = sqlx::query("INSERT INTO lessons (course_id, title, sort_order) VALUES (?, 'l', ?)")
        .bind(course)
        .bind(order)
        .execute(&pool)
        .await
        .unwrap()
        .last_insert_rowid();
      ids.push(id);
    }
    // ids[1] has order 1, ids[2] order 2, ids[0] order 3.
    assert_eq!(neighbours(&pool, course, ids[2]).await.unwrap(), (Some(ids[1]), Some(ids[0])));
    assert!(exists(&pool, ids[0]).await.unwrap());
    assert!(!exists(&pool, 4242).await.unwrap());

    sqlx::query("UPDATE lessons SET is_published = 0 WHERE id = ?").bind(ids[0]).execute(&pool).await.unwrap();
    assert!(!exists(&pool, ids[0]).await.unwrap());
  }

  #[tokio::test]
  async fn duplicate_order_in_course_is_rejected() {
    let pool = test_pool().await;
    sqlx::query("INSERT INTO courses (language, level, title) VALUES ('vietnamese', 'A1', 'A1')")
      .execute(&pool)
      .await
      .unwrap();
    let insert = "INSERT INTO lessons (course_id, title, sort_order) VALUES (1, 'l', 1)";
    sqlx::query(insert).execute(&pool).await.unwrap();
    let err = sqlx::query(insert).execute(&pool).await.unwrap_err();
    assert!(crate::db::is_unique_violation(&err));
  }
}
