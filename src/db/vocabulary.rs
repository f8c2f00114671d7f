use sqlx::SqlitePool;

use crate::domain::{DictionaryEntry, Section, Vocabulary};

/// Vocabulary of a lesson, `order` ascending, optionally limited to one section.
pub async fn list_for_lesson(
  pool: &SqlitePool,
  lesson_id: i64,
  section: Option<Section>,
) -> Result<Vec<Vocabulary>, sqlx::Error> {
  sqlx::query_as::<_, Vocabulary>(
    r#"
    SELECT id, lesson_id, word, reading, meaning, example, difficulty, section, sort_order
    FROM vocabulary
    WHERE lesson_id = ?1 AND (?2 IS NULL OR section = ?2)
    ORDER BY sort_order ASC, id ASC
    "#,
  )
  .bind(lesson_id)
  .bind(section.map(|s| s.as_str()))
  .fetch_all(pool)
  .await
}

/// Dictionary lookup over word, reading and meaning. ASCII matching is
/// case-insensitive (SQLite LIKE); `%` and `_` in the query match literally.
pub async fn search(
  pool: &SqlitePool,
  query: &str,
  language: Option<&str>,
  limit: i64,
) -> Result<Vec<DictionaryEntry>, sqlx::Error> {
  let pattern = format!("%{}%", escape_like(query));
  sqlx::query_as::<_, DictionaryEntry>(
    r#"
    SELECT v.id, v.word, v.reading, v.meaning, v.example,
           l.id AS lesson_id, l.title AS lesson_title, c.language, c.level
    FROM vocabulary v
    JOIN lessons l ON l.id = v.lesson_id AND l.is_published = 1
    JOIN courses c ON c.id = l.course_id AND c.is_published = 1
    WHERE (v.word LIKE ?1 ESCAPE '\' OR v.reading LIKE ?1 ESCAPE '\' OR v.meaning LIKE ?1 ESCAPE '\')
      AND (?2 IS NULL OR c.language = ?2)
    ORDER BY CASE WHEN v.word = ?3 THEN 0 ELSE 1 END, c.language, c.sort_order, l.sort_order, v.sort_order
    LIMIT ?4
    "#,
  )
  .bind(pattern)
  .bind(language)
  .bind(query)
  .bind(limit)
  .fetch_all(pool)
  .await
}

fn escape_like(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for ch in s.chars() {
    if matches!(ch, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(ch);
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::test_pool;

  async fn fixture(pool: &SqlitePool) -> i64 {
    sqlx::query("INSERT INTO courses (language, level, title) VALUES ('japanese', 'N5', 'N5')")
      .execute(pool)
      .await
      .unwrap();
    let lesson = sqlx::query("INSERT INTO lessons (course_id, title, sort_order) VALUES (1, 'Food', 1)")
      .execute(pool)
      .await
      .unwrap()
      .last_insert_rowid();
    for (word, reading, meaning, section, order) in [
      ("飲む", "のむ", "to drink", "main", 2),
      ("食べる", "たべる", "to eat", "main", 1),
      ("いただきます", "いただきます", "let's eat (before meals)", "conversation", 3),
      ("100%", "ひゃくパーセント", "one hundred percent", "reading", 4),
    ] {
      sqlx::query(
        "INSERT INTO vocabulary (lesson_id, word, reading, meaning, section, sort_order) VALUES (?, ?, ?, ?, ?, ?)",
      )
      .bind(lesson)
      .bind(word)
      .bind(reading)
      .bind(meaning)
      .bind(section)
      .bind(order)
      .execute(pool)
      .await
      .unwrap();
    }
    lesson
  }

  #[tokio::test]
  async fn lesson_vocabulary_is_ordered_and_filterable() {
    let pool = test_pool().await;
    let lesson = fixture(&pool).await;

    let all = list_for_lesson(&pool, lesson, None).await.unwrap();
    let orders: Vec<i64> = all.iter().map(|v| v.order).collect();
    assert_eq!(orders, [1, 2, 3, 4]);
    assert_eq!(all[0].word, "食べる");

    let conversation = list_for_lesson(&pool, lesson, Some(Section::Conversation)).await.unwrap();
    assert_eq!(conversation.len(), 1);
    assert_eq!(conversation[0].section, Section::Conversation);
  }

  #[tokio::test]
  async fn search_matches_meaning_case_insensitively() {
    let pool = test_pool().await;
    fixture(&pool).await;

    let hits = search(&pool, "TO EAT", None, 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].word, "食べる");
    assert_eq!(hits[0].lesson_title, "Food");

    assert!(search(&pool, "eat", Some("korean"), 10).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn search_treats_wildcards_literally() {
    let pool = test_pool().await;
    fixture(&pool).await;
    let hits = search(&pool, "%", None, 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].word, "100%");
    assert_eq!(escape_like("a_b%"), "a\\_b\\%");
  }
}
