//! HTTP endpoint handlers for content browsing, quizzes and the assistant.
//! These are thin wrappers that validate input, forward to the store or core
//! logic, and log the result shape.

use std::sync::Arc;

use axum::{
  extract::{Path, Query, State},
  Json,
};
use tracing::{info, instrument};

use crate::auth::MaybeUser;
use crate::db::{self, courses, lessons, progress, vocabulary};
use crate::domain::{DictionaryEntry, Lesson, Section, Vocabulary};
use crate::error::{AppError, AppJson};
use crate::logic;
use crate::protocol::*;
use crate::quiz::{self, Quiz, QuizResult, QuizSubmission, DEFAULT_QUESTION_COUNT};
use crate::state::AppState;

const DEFAULT_SEARCH_LIMIT: i64 = 20;
const MAX_SEARCH_LIMIT: i64 = 100;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> Json<HealthOut> {
  Json(HealthOut { ok: true, database: db::ping(&state.db).await })
}

#[instrument(level = "info", skip(state))]
pub async fn http_languages(State(state): State<Arc<AppState>>) -> Result<Json<LanguagesOut>, AppError> {
  let languages = courses::list_languages(&state.db).await?;
  info!(target: "content", count = languages.len(), "Languages listed");
  Ok(Json(LanguagesOut { languages }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_levels(
  State(state): State<Arc<AppState>>,
  Path(language): Path<String>,
) -> Result<Json<LevelsOut>, AppError> {
  let language = language.trim().to_lowercase();
  let levels = courses::list_levels(&state.db, &language).await?;
  if levels.is_empty() {
    return Err(AppError::not_found(format!("No courses found for language '{language}'")));
  }
  Ok(Json(LevelsOut { language, levels }))
}

#[instrument(level = "info", skip(state), fields(language = ?q.language))]
pub async fn http_courses(
  State(state): State<Arc<AppState>>,
  Query(q): Query<CoursesQuery>,
) -> Result<Json<CoursesOut>, AppError> {
  let language = q.language.map(|l| l.trim().to_lowercase()).filter(|l| !l.is_empty());
  let courses = courses::list(&state.db, language.as_deref()).await?;
  info!(target: "content", count = courses.len(), "Courses listed");
  Ok(Json(CoursesOut { courses }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_course_detail(
  State(state): State<Arc<AppState>>,
  Path((language, level)): Path<(String, String)>,
) -> Result<Json<CourseDetailOut>, AppError> {
  let language = language.trim().to_lowercase();
  let course = courses::find_by_language_level(&state.db, &language, level.trim())
    .await?
    .ok_or_else(|| AppError::not_found(format!("Course {language}/{level} not found")))?;
  let lessons = lessons::list_for_course(&state.db, course.id).await?;
  info!(target: "content", course_id = course.id, lessons = lessons.len(), "Course served");
  Ok(Json(CourseDetailOut { course, lessons }))
}

async fn published_lesson(state: &AppState, id: i64) -> Result<Lesson, AppError> {
  lessons::find_by_id(&state.db, id)
    .await?
    .ok_or_else(|| AppError::not_found(format!("Lesson {id} not found")))
}

#[instrument(level = "info", skip(state, user), fields(authenticated = user.0.is_some()))]
pub async fn http_lesson_detail(
  State(state): State<Arc<AppState>>,
  Path(id): Path<i64>,
  user: MaybeUser,
) -> Result<Json<LessonDetailOut>, AppError> {
  let lesson = published_lesson(&state, id).await?;
  let course = courses::find_by_id(&state.db, lesson.course_id)
    .await?
    .ok_or_else(|| AppError::not_found(format!("Course for lesson {id} not found")))?;
  let (previous_lesson_id, next_lesson_id) = lessons::neighbours(&state.db, course.id, lesson.id).await?;

  let progress = match &user.0 {
    Some(u) => progress::find(&state.db, &u.id, lesson.id).await?,
    None => None,
  };

  info!(target: "content", lesson_id = id, ?previous_lesson_id, ?next_lesson_id, "Lesson served");
  Ok(Json(LessonDetailOut { lesson, course, previous_lesson_id, next_lesson_id, progress }))
}

#[instrument(level = "info", skip(state), fields(section = ?q.section))]
pub async fn http_lesson_vocabulary(
  State(state): State<Arc<AppState>>,
  Path(id): Path<i64>,
  Query(q): Query<VocabularyQuery>,
) -> Result<Json<VocabularyOut>, AppError> {
  let section = match q.section.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
    Some(raw) => Some(raw.parse::<Section>().map_err(|e| AppError::bad_request(e.to_string()))?),
    None => None,
  };
  published_lesson(&state, id).await?;
  let vocabulary = vocabulary::list_for_lesson(&state.db, id, section).await?;
  info!(target: "content", lesson_id = id, count = vocabulary.len(), "Vocabulary served");
  Ok(Json(VocabularyOut {
    lesson_id: id,
    section: section.map(|s| s.to_string()),
    vocabulary,
  }))
}

#[instrument(level = "info", skip(state, q), fields(q_len = q.q.len(), language = ?q.language))]
pub async fn http_search(
  State(state): State<Arc<AppState>>,
  Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<DictionaryEntry>>, AppError> {
  let term = q.q.trim();
  if term.is_empty() {
    return Err(AppError::bad_request("Query parameter 'q' is required"));
  }
  let language = q.language.as_deref().map(|l| l.trim().to_lowercase()).filter(|l| !l.is_empty());
  let limit = q.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).clamp(1, MAX_SEARCH_LIMIT);

  let hits = vocabulary::search(&state.db, term, language.as_deref(), limit).await?;
  info!(target: "content", hits = hits.len(), "Dictionary search");
  Ok(Json(hits))
}

async fn lesson_vocabulary(state: &AppState, id: i64) -> Result<Vec<Vocabulary>, AppError> {
  published_lesson(state, id).await?;
  Ok(vocabulary::list_for_lesson(&state.db, id, None).await?)
}

#[instrument(level = "info", skip(state), fields(count = ?q.count))]
pub async fn http_get_quiz(
  State(state): State<Arc<AppState>>,
  Path(id): Path<i64>,
  Query(q): Query<QuizQuery>,
) -> Result<Json<Quiz>, AppError> {
  let vocab = lesson_vocabulary(&state, id).await?;
  let quiz = quiz::build_quiz(id, &vocab, q.count.unwrap_or(DEFAULT_QUESTION_COUNT), &mut rand::thread_rng());
  info!(target: "content", lesson_id = id, questions = quiz.questions.len(), "Quiz built");
  Ok(Json(quiz))
}

#[instrument(level = "info", skip(state, body), fields(answers = body.answers.len()))]
pub async fn http_post_quiz(
  State(state): State<Arc<AppState>>,
  Path(id): Path<i64>,
  AppJson(body): AppJson<QuizSubmission>,
) -> Result<Json<QuizResult>, AppError> {
  let vocab = lesson_vocabulary(&state, id).await?;
  let result = quiz::grade(&vocab, &body)?;
  info!(target: "content", lesson_id = id, correct = result.correct, total = result.total, "Quiz graded");
  Ok(Json(result))
}

#[instrument(level = "info", skip(state, body), fields(text_len = body.text.len()))]
pub async fn http_post_explain(
  State(state): State<Arc<AppState>>,
  AppJson(body): AppJson<ExplainIn>,
) -> Result<Json<AssistantOut>, AppError> {
  let reply = logic::explain(&state, &body.text, body.language.as_deref(), body.provider.as_deref()).await?;
  Ok(Json(AssistantOut { text: reply.text, provider: reply.provider.to_string() }))
}

#[instrument(level = "info", skip(state, body), fields(message_len = body.message.len(), history_len = body.history.len()))]
pub async fn http_post_chat(
  State(state): State<Arc<AppState>>,
  AppJson(body): AppJson<ChatIn>,
) -> Result<Json<AssistantOut>, AppError> {
  let reply = logic::chat(&state, &body.message, &body.history, body.provider.as_deref()).await?;
  Ok(Json(AssistantOut { text: reply.text, provider: reply.provider.to_string() }))
}
