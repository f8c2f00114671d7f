//! Lingua · multi-language learning backend.
//!
//! Content (courses, lessons, vocabulary) lives in SQLite and is served as
//! JSON under `/api/v1`; accounts, progress and a dashboard sit on top, and an
//! assistant proxies explain/chat requests to OpenAI, Gemini or Ollama.
//! The listening tracker is a standalone key/value-backed module.

pub mod ai;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod domain;
pub mod error;
pub mod listening;
pub mod logic;
pub mod pinyin;
pub mod protocol;
pub mod quiz;
pub mod routes;
pub mod seeds;
pub mod state;
pub mod telemetry;
pub mod util;

pub use routes::build_router;
pub use state::AppState;
