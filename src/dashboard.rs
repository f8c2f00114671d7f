//! Dashboard gamification derived from server-side progress: XP, level,
//! streaks and per-course completion.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::progress;
use crate::domain::CourseProgress;

pub const XP_PER_LESSON: i64 = 10;
pub const XP_PER_LEVEL: i64 = 100;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
  pub completed_lessons: i64,
  pub completed_today: i64,
  pub xp: i64,
  pub level: i64,
  pub xp_into_level: i64,
  pub xp_for_next_level: i64,
  pub current_streak: u32,
  pub longest_streak: u32,
  pub courses_started: usize,
  pub courses_completed: usize,
  pub courses: Vec<CourseProgress>,
}

/// (current, longest) runs of consecutive days. The current streak is still
/// alive when the last active day is today or yesterday.
pub fn streaks(days: &[NaiveDate], today: NaiveDate) -> (u32, u32) {
  let mut days = days.to_vec();
  days.sort_unstable();
  days.dedup();

  let mut longest = 0u32;
  let mut run = 0u32;
  let mut prev: Option<NaiveDate> = None;
  for &d in &days {
    run = match prev {
      Some(p) if d - p == Duration::days(1) => run + 1,
      _ => 1,
    };
    longest = longest.max(run);
    prev = Some(d);
  }

  let current = match days.last() {
    Some(&last) if last == today || last == today - Duration::days(1) => run,
    _ => 0,
  };
  (current, longest)
}

pub fn summarize(courses: Vec<CourseProgress>, completions: &[DateTime<Utc>], now: DateTime<Utc>) -> Dashboard {
  let today = now.date_naive();
  let days: Vec<NaiveDate> = completions.iter().map(|t| t.date_naive()).collect();
  let (current_streak, longest_streak) = streaks(&days, today);

  let completed_lessons = completions.len() as i64;
  let xp = completed_lessons * XP_PER_LESSON;
  let courses_started = courses.iter().filter(|c| c.completed_lessons > 0).count();
  let courses_completed = courses
    .iter()
    .filter(|c| c.total_lessons > 0 && c.completed_lessons >= c.total_lessons)
    .count();

  Dashboard {
    completed_lessons,
    completed_today: days.iter().filter(|&&d| d == today).count() as i64,
    xp,
    level: xp / XP_PER_LEVEL + 1,
    xp_into_level: xp % XP_PER_LEVEL,
    xp_for_next_level: XP_PER_LEVEL,
    current_streak,
    longest_streak,
    courses_started,
    courses_completed,
    courses,
  }
}

pub async fn load(pool: &SqlitePool, user_id: &str) -> Result<Dashboard, sqlx::Error> {
  let courses = progress::course_completion(pool, user_id).await?;
  let completions = progress::completion_times(pool, user_id).await?;
  Ok(summarize(courses, &completions, Utc::now()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn streak_alive_through_yesterday() {
    let today = day(2024, 3, 10);
    let days = [day(2024, 3, 7), day(2024, 3, 8), day(2024, 3, 9), day(2024, 3, 9)];
    assert_eq!(streaks(&days, today), (3, 3));
  }

  #[test]
  fn broken_streak_keeps_longest() {
    let today = day(2024, 3, 10);
    let days = [day(2024, 2, 1), day(2024, 2, 2), day(2024, 2, 3), day(2024, 2, 4), day(2024, 3, 10)];
    assert_eq!(streaks(&days, today), (1, 4));
    assert_eq!(streaks(&days[..4], today), (0, 4));
    assert_eq!(streaks(&[], today), (0, 0));
  }

  #[test]
  fn xp_and_levels() {
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
    let completions: Vec<DateTime<Utc>> = (0..12).map(|i| now - Duration::hours(i)).collect();
    let course = CourseProgress {
      course_id: 1,
      language: "english".into(),
      level: "A1".into(),
      title: "A1".into(),
      total_lessons: 12,
      completed_lessons: 12,
      percentage: 100.0,
    };
    let d = summarize(vec![course], &completions, now);
    assert_eq!(d.xp, 120);
    assert_eq!(d.level, 2);
    assert_eq!(d.xp_into_level, 20);
    assert_eq!(d.completed_today, 12);
    assert_eq!(d.courses_started, 1);
    assert_eq!(d.courses_completed, 1);
    assert_eq!(d.current_streak, 1);
  }
}
