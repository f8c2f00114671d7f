//! Runtime configuration: environment settings plus the optional TOML agent
//! config (assistant prompt overrides).
//!
//! See `Settings`, `AiSettings` and `Prompts` for the expected schema.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::ai::AiProvider;

const DEV_JWT_SECRET: &str = "lingua-dev-secret-change-me";

/// Process-wide settings, read once at startup.
#[derive(Clone, Debug)]
pub struct Settings {
  pub port: u16,
  pub database_url: String,
  pub jwt_secret: String,
  pub jwt_ttl_hours: i64,
  pub bcrypt_cost: u32,
  /// When set, fixtures from this directory are upserted at startup.
  pub seed_data_dir: Option<String>,
  pub ai: AiSettings,
}

/// Provider switch and credentials for the assistant.
#[derive(Clone, Debug)]
pub struct AiSettings {
  pub provider: AiProvider,
  pub timeout: Duration,
  pub openai_api_key: Option<String>,
  pub openai_base_url: String,
  pub openai_model: String,
  pub gemini_api_key: Option<String>,
  pub gemini_base_url: String,
  pub gemini_model: String,
  pub ollama_base_url: String,
  pub ollama_model: String,
}

impl Default for AiSettings {
  fn default() -> Self {
    Self {
      provider: AiProvider::OpenAi,
      timeout: Duration::from_secs(60),
      openai_api_key: None,
      openai_base_url: "https://api.openai.com/v1".into(),
      openai_model: "gpt-4o-mini".into(),
      gemini_api_key: None,
      gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
      gemini_model: "gemini-1.5-flash".into(),
      ollama_base_url: "http://localhost:11434".into(),
      ollama_model: "llama3".into(),
    }
  }
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      port: 3000,
      database_url: "sqlite:lingua.db?mode=rwc".into(),
      jwt_secret: DEV_JWT_SECRET.into(),
      jwt_ttl_hours: 24,
      bcrypt_cost: bcrypt::DEFAULT_COST,
      seed_data_dir: None,
      ai: AiSettings::default(),
    }
  }
}

impl Settings {
  /// Build settings from the environment (after loading `.env` if present).
  /// Unparseable values fall back to defaults with a warning.
  pub fn from_env() -> Self {
    dotenvy::dotenv().ok();
    let mut s = Self::default();

    if let Some(port) = env_parse::<u16>("PORT") { s.port = port; }
    if let Some(url) = env_string("DATABASE_URL") { s.database_url = url; }
    match env_string("JWT_SECRET") {
      Some(secret) => s.jwt_secret = secret,
      None => warn!(target: "lingua_backend", "JWT_SECRET not set; using the development secret"),
    }
    if let Some(h) = env_parse::<i64>("JWT_TTL_HOURS") { s.jwt_ttl_hours = h.max(1); }
    if let Some(cost) = env_parse::<u32>("BCRYPT_COST") { s.bcrypt_cost = cost.clamp(4, 31); }
    s.seed_data_dir = env_string("SEED_DATA_DIR");

    let ai = &mut s.ai;
    if let Some(raw) = env_string("AI_PROVIDER") {
      match raw.parse::<AiProvider>() {
        Ok(p) => ai.provider = p,
        Err(e) => warn!(target: "ai", value = %raw, error = %e, "Unknown AI_PROVIDER; keeping default"),
      }
    }
    if let Some(secs) = env_parse::<u64>("AI_TIMEOUT_SECS") { ai.timeout = Duration::from_secs(secs); }
    ai.openai_api_key = env_string("OPENAI_API_KEY");
    if let Some(v) = env_string("OPENAI_BASE_URL") { ai.openai_base_url = v; }
    if let Some(v) = env_string("OPENAI_MODEL") { ai.openai_model = v; }
    ai.gemini_api_key = env_string("GEMINI_API_KEY").or_else(|| env_string("GOOGLE_API_KEY"));
    if let Some(v) = env_string("GEMINI_BASE_URL") { ai.gemini_base_url = v; }
    if let Some(v) = env_string("GEMINI_MODEL") { ai.gemini_model = v; }
    if let Some(v) = env_string("OLLAMA_BASE_URL") { ai.ollama_base_url = v; }
    if let Some(v) = env_string("OLLAMA_MODEL") { ai.ollama_model = v; }

    s
  }
}

fn env_string(key: &str) -> Option<String> {
  std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
  let raw = env_string(key)?;
  match raw.trim().parse::<T>() {
    Ok(v) => Some(v),
    Err(_) => {
      warn!(target: "lingua_backend", %key, value = %raw, "Ignoring unparseable environment value");
      None
    }
  }
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
}

/// Instruction templates sent with every assistant call. Defaults target
/// language learners; override them in TOML to tune tone/structure.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub explain_system: String,
  /// Placeholders: `{language}`, `{text}`.
  pub explain_user_template: String,
  pub chat_system: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      explain_system: "You are a patient language teacher for Japanese, Chinese, English, Korean and Vietnamese learners. Answer in English unless asked otherwise. Be concise and accurate.".into(),
      explain_user_template: "Explain the following {language} text for a learner. Give the meaning, the reading or pronunciation, the key grammar points and one short example sentence.\n\nText: {text}".into(),
      chat_system: "You are a friendly language-learning coach. Answer questions about vocabulary, grammar and pronunciation in 1-4 short paragraphs. Correct mistakes gently.".into(),
    }
  }
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AgentConfig>(&s) {
      Ok(cfg) => {
        info!(target: "lingua_backend", %path, "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "lingua_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "lingua_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
