use sqlx::SqlitePool;

use crate::domain::Course;

const SELECT_COURSE: &str = r#"
  SELECT c.id, c.language, c.level, c.title, c.description, c.is_published, c.sort_order,
         (SELECT COUNT(*) FROM lessons l WHERE l.course_id = c.id AND l.is_published = 1) AS lesson_count
  FROM courses c
"#;

/// Distinct languages that have at least one published course.
pub async fn list_languages(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
  sqlx::query_scalar("SELECT DISTINCT language FROM courses WHERE is_published = 1 ORDER BY language")
    .fetch_all(pool)
    .await
}

/// Levels of one language in course order.
pub async fn list_levels(pool: &SqlitePool, language: &str) -> Result<Vec<String>, sqlx::Error> {
  sqlx::query_scalar(
    "SELECT level FROM courses WHERE language = ? AND is_published = 1 ORDER BY sort_order, level",
  )
  .bind(language)
  .fetch_all(pool)
  .await
}

pub async fn list(pool: &SqlitePool, language: Option<&str>) -> Result<Vec<Course>, sqlx::Error> {
  let sql = format!(
    "{SELECT_COURSE} WHERE c.is_published = 1 AND (?1 IS NULL OR c.language = ?1) ORDER BY c.language, c.sort_order, c.level"
  );
  sqlx::query_as::<_, Course>(&sql).bind(language).fetch_all(pool).await
}

pub async fn find_by_language_level(
  pool: &SqlitePool,
  language: &str,
  level: &str,
) -> Result<Option<Course>, sqlx::Error> {
  let sql = format!("{SELECT_COURSE} WHERE c.language = ? AND c.level = ? AND c.is_published = 1");
  sqlx::query_as::<_, Course>(&sql)
    .bind(language)
    .bind(level)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Course>, sqlx::Error> {
  let sql = format!("{SELECT_COURSE} WHERE c.id = ?");
  sqlx::query_as::<_, Course>(&sql).bind(id).fetch_optional(pool).await
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::test_pool;

  async fn insert_course(pool: &SqlitePool, language: &str, level: &str, order: i64, published: bool) -> i64 {
    sqlx::query("INSERT INTO courses (language, level, title, sort_order, is_published) VALUES (?, ?, ?, ?, ?)")
      .bind(language)
      .bind(level)
      .bind(format!("{language} {level}"))
      .bind(order)
      .bind(published)
      .execute(pool)
      .await
      .unwrap()
      .last_insert_rowid()
  }

  #[tokio::test]
  async fn levels_follow_course_order_and_skip_unpublished() {
    let pool = test_pool().await;
    insert_course(&pool, "japanese", "N4", 2, true).await;
    insert_course(&pool, "japanese", "N5", 1, true).await;
    insert_course(&pool, "japanese", "N3", 3, false).await;
    insert_course(&pool, "korean", "TOPIK1", 1, true).await;

    assert_eq!(list_levels(&pool, "japanese").await.unwrap(), ["N5", "N4"]);
    assert_eq!(list_languages(&pool).await.unwrap(), ["japanese", "korean"]);
    assert!(list_levels(&pool, "french").await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn lesson_count_ignores_unpublished_lessons() {
    let pool = test_pool().await;
    let id = insert_course(&pool, "chinese", "HSK1", 1, true).await;
    for (order, published) in [(1, true), (2, true), (3, false)] {
      sqlx::query("INSERT INTO lessons (course_id, title, sort_order, is_published) VALUES (?, 'l', ?, ?)")
        .bind(id)
        .bind(order)
        .bind(published)
        .execute(&pool)
        .await
        .unwrap();
    }
    let course = find_by_language_level(&pool, "chinese", "HSK1").await.unwrap().unwrap();
    assert_eq!(course.lesson_count, 2);
    assert_eq!(find_by_id(&pool, id).await.unwrap().unwrap().level, "HSK1");

    let all = list(&pool, None).await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(list(&pool, Some("english")).await.unwrap().is_empty());
  }
}
