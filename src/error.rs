//! Handler-boundary error type and the JSON body extractor.
//!
//! Every handler returns `Result<_, AppError>`. Client errors carry their
//! message through to the body; database and provider failures are logged and
//! replaced with a fixed message.

use axum::{
  async_trait,
  extract::{FromRequest, Request},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::ai::AiError;

pub const AI_FAILURE_MESSAGE: &str = "Failed to get AI response";
pub const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum AppError {
  #[error("{0}")]
  NotFound(String),
  #[error("{0}")]
  BadRequest(String),
  #[error("{0}")]
  Unauthorized(String),
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),
  #[error("AI provider error: {0}")]
  Ai(#[from] AiError),
  #[error("{0}")]
  Internal(String),
}

impl AppError {
  pub fn not_found(message: impl Into<String>) -> Self {
    Self::NotFound(message.into())
  }

  pub fn bad_request(message: impl Into<String>) -> Self {
    Self::BadRequest(message.into())
  }

  pub fn unauthorized(message: impl Into<String>) -> Self {
    Self::Unauthorized(message.into())
  }

  pub fn status(&self) -> StatusCode {
    match self {
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
      AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      AppError::Database(_) | AppError::Ai(_) | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

impl From<validator::ValidationErrors> for AppError {
  fn from(e: validator::ValidationErrors) -> Self {
    AppError::BadRequest(format!("Validation error: {e}"))
  }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
  pub error: String,
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      AppError::Database(e) => {
        error!(target: "lingua_backend", error = %e, "Database error");
        INTERNAL_MESSAGE.to_string()
      }
      AppError::Ai(e) => {
        error!(target: "ai", error = %e, "AI provider call failed");
        AI_FAILURE_MESSAGE.to_string()
      }
      AppError::Internal(e) => {
        error!(target: "lingua_backend", error = %e, "Internal error");
        INTERNAL_MESSAGE.to_string()
      }
      other => other.to_string(),
    };
    (status, Json(ErrorBody { error: message })).into_response()
  }
}

/// JSON extractor that rejects malformed bodies with a JSON 400 instead of
/// axum's plain-text rejection.
pub struct AppJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for AppJson<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = AppError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    match Json::<T>::from_request(req, state).await {
      Ok(Json(value)) => Ok(AppJson(value)),
      Err(rejection) => {
        let message = format!("Failed to parse JSON request body: {}", rejection.body_text());
        warn!(target: "lingua_backend", %message, "Rejected request body");
        Err(AppError::BadRequest(message))
      }
    }
  }
}
