//! Account endpoints: registration, login, progress and the dashboard.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use tracing::{info, instrument};

use crate::auth::{self, CurrentUser, LoginRequest, LoginResponse, RegisterRequest};
use crate::dashboard::{self, Dashboard};
use crate::db::{lessons, progress};
use crate::domain::{User, UserProgress};
use crate::error::{AppError, AppJson};
use crate::protocol::{ProgressIn, ProgressOut};
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
pub async fn http_register(
  State(state): State<Arc<AppState>>,
  AppJson(body): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
  let user = auth::register(&state, body).await?;
  Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(level = "info", skip_all)]
pub async fn http_login(
  State(state): State<Arc<AppState>>,
  AppJson(body): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
  Ok(Json(auth::login(&state, body).await?))
}

#[instrument(level = "info", skip(state, user), fields(user_id = %user.id))]
pub async fn http_get_progress(
  State(state): State<Arc<AppState>>,
  user: CurrentUser,
) -> Result<Json<ProgressOut>, AppError> {
  let courses = progress::course_completion(&state.db, &user.id).await?;
  info!(target: "progress", courses = courses.len(), "Progress aggregated");
  Ok(Json(ProgressOut { courses }))
}

#[instrument(level = "info", skip(state, user, body), fields(user_id = %user.id, lesson_id = ?body.lesson_id, is_completed = body.is_completed))]
pub async fn http_post_progress(
  State(state): State<Arc<AppState>>,
  user: CurrentUser,
  AppJson(body): AppJson<ProgressIn>,
) -> Result<Json<UserProgress>, AppError> {
  let lesson_id = body.lesson_id.ok_or_else(|| AppError::bad_request("lessonId is required"))?;
  if !lessons::exists(&state.db, lesson_id).await? {
    return Err(AppError::not_found(format!("Lesson {lesson_id} not found")));
  }
  let saved = progress::upsert(&state.db, &user.id, lesson_id, body.is_completed, Utc::now()).await?;
  info!(target: "progress", lesson_id, completed = saved.is_completed, "Progress saved");
  Ok(Json(saved))
}

#[instrument(level = "info", skip(state, user), fields(user_id = %user.id))]
pub async fn http_dashboard(
  State(state): State<Arc<AppState>>,
  user: CurrentUser,
) -> Result<Json<Dashboard>, AppError> {
  let summary = dashboard::load(&state.db, &user.id).await?;
  info!(target: "progress", xp = summary.xp, streak = summary.current_streak, "Dashboard served");
  Ok(Json(summary))
}
