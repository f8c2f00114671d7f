//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Domain rows serialize directly; this module holds request bodies, query
//! strings and the composite responses that don't map to a single table.

use serde::{Deserialize, Serialize};

use crate::ai::ChatTurn;
use crate::domain::{Course, CourseProgress, Lesson, LessonSummary, UserProgress, Vocabulary};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Explain {
        text: String,
        #[serde(default)]
        language: Option<String>,
        #[serde(default)]
        provider: Option<String>,
    },
    Chat {
        message: String,
        #[serde(default)]
        history: Vec<ChatTurn>,
        #[serde(default)]
        provider: Option<String>,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Reply {
        text: String,
        provider: String,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub database: bool,
}

#[derive(Debug, Serialize)]
pub struct LanguagesOut {
    pub languages: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LevelsOut {
    pub language: String,
    pub levels: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CoursesQuery {
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CoursesOut {
    pub courses: Vec<Course>,
}

#[derive(Debug, Serialize)]
pub struct CourseDetailOut {
    pub course: Course,
    pub lessons: Vec<LessonSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDetailOut {
    pub lesson: Lesson,
    pub course: Course,
    pub previous_lesson_id: Option<i64>,
    pub next_lesson_id: Option<i64>,
    /// Present only for authenticated callers with a recorded row.
    pub progress: Option<UserProgress>,
}

#[derive(Debug, Deserialize)]
pub struct VocabularyQuery {
    pub section: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyOut {
    pub lesson_id: i64,
    pub section: Option<String>,
    pub vocabulary: Vec<Vocabulary>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub language: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct QuizQuery {
    pub count: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressIn {
    pub lesson_id: Option<i64>,
    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Debug, Serialize)]
pub struct ProgressOut {
    pub courses: Vec<CourseProgress>,
}

#[derive(Debug, Deserialize)]
pub struct ExplainIn {
    #[serde(default)]
    pub text: String,
    pub language: Option<String>,
    pub provider: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatIn {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    pub provider: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AssistantOut {
    pub text: String,
    pub provider: String,
}
