//! Assistant facade over the supported LLM providers.
//!
//! One logical operation ("complete this conversation") dispatched to OpenAI,
//! Google Generative AI or a local Ollama server. The provider is chosen
//! statically from configuration; a request may name another provider to
//! re-ask manually. No retries, no caching, no streaming.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::AiSettings;

pub mod gemini;
pub mod ollama;
pub mod openai;

use gemini::Gemini;
use ollama::Ollama;
use openai::OpenAI;

/// Most recent turns forwarded to a provider.
pub const MAX_HISTORY_TURNS: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiProvider {
  #[serde(rename = "openai")]
  OpenAi,
  #[serde(rename = "gemini")]
  Gemini,
  #[serde(rename = "ollama")]
  Ollama,
}

impl AiProvider {
  pub fn as_str(&self) -> &'static str {
    match self {
      AiProvider::OpenAi => "openai",
      AiProvider::Gemini => "gemini",
      AiProvider::Ollama => "ollama",
    }
  }
}

impl fmt::Display for AiProvider {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for AiProvider {
  type Err = AiError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "openai" | "gpt" => Ok(AiProvider::OpenAi),
      "gemini" | "google" => Ok(AiProvider::Gemini),
      "ollama" | "local" => Ok(AiProvider::Ollama),
      other => Err(AiError::UnknownProvider(other.to_string())),
    }
  }
}

#[derive(Debug, Error)]
pub enum AiError {
  #[error("provider not configured: {0} is missing")]
  NotConfigured(&'static str),
  #[error("unknown provider '{0}'")]
  UnknownProvider(String),
  #[error("request failed: {0}")]
  Request(#[from] reqwest::Error),
  #[error("{provider} HTTP {status}: {message}")]
  HttpStatus {
    provider: AiProvider,
    status: reqwest::StatusCode,
    message: String,
  },
  #[error("JSON decode failed: {0}")]
  Json(#[from] serde_json::Error),
  #[error("empty response from {0}")]
  EmptyResponse(AiProvider),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
  User,
  Assistant,
}

/// One prior exchange in a chat conversation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatTurn {
  pub role: ChatRole,
  pub content: String,
}

/// Keep only the tail of the conversation that providers get to see.
pub fn recent_history(history: &[ChatTurn]) -> &[ChatTurn] {
  let skip = history.len().saturating_sub(MAX_HISTORY_TURNS);
  &history[skip..]
}

#[derive(Clone)]
pub struct Assistant {
  pub default_provider: AiProvider,
  openai: OpenAI,
  gemini: Gemini,
  ollama: Ollama,
}

impl Assistant {
  pub fn from_settings(settings: &AiSettings) -> Self {
    let client = reqwest::Client::builder()
      .timeout(settings.timeout)
      .build()
      .unwrap_or_else(|e| {
        warn!(target: "ai", error = %e, timeout = ?settings.timeout, "HTTP client builder failed; using defaults without the configured timeout");
        reqwest::Client::new()
      });

    Self {
      default_provider: settings.provider,
      openai: OpenAI::new(
        client.clone(),
        settings.openai_api_key.clone(),
        &settings.openai_base_url,
        &settings.openai_model,
      ),
      gemini: Gemini::new(
        client.clone(),
        settings.gemini_api_key.clone(),
        &settings.gemini_base_url,
        &settings.gemini_model,
      ),
      ollama: Ollama::new(client, &settings.ollama_base_url, &settings.ollama_model),
    }
  }

  /// Whether the provider has what it needs to be called (an API key for the
  /// hosted ones; Ollama is assumed reachable).
  pub fn is_configured(&self, provider: AiProvider) -> bool {
    match provider {
      AiProvider::OpenAi => self.openai.api_key.is_some(),
      AiProvider::Gemini => self.gemini.api_key.is_some(),
      AiProvider::Ollama => true,
    }
  }

  pub fn model_for(&self, provider: AiProvider) -> &str {
    match provider {
      AiProvider::OpenAi => &self.openai.model,
      AiProvider::Gemini => &self.gemini.model,
      AiProvider::Ollama => &self.ollama.model,
    }
  }

  /// Send `system` + trimmed `history` + `user` to the chosen provider and
  /// return its text verbatim (trimmed).
  #[instrument(level = "info", target = "ai", skip(self, system, history, user),
               fields(%provider, history_len = history.len(), user_len = user.len()))]
  pub async fn complete(
    &self,
    provider: AiProvider,
    system: &str,
    history: &[ChatTurn],
    user: &str,
  ) -> Result<String, AiError> {
    let history = recent_history(history);
    let start = std::time::Instant::now();
    let text = match provider {
      AiProvider::OpenAi => self.openai.chat(system, history, user, 0.3).await?,
      AiProvider::Gemini => self.gemini.generate(system, history, user, 0.3).await?,
      AiProvider::Ollama => self.ollama.chat(system, history, user, 0.3).await?,
    };
    info!(target: "ai", %provider, elapsed = ?start.elapsed(), reply_len = text.len(), "Provider reply received");
    if text.is_empty() {
      return Err(AiError::EmptyResponse(provider));
    }
    Ok(text)
  }
}

/// Pull `error.message` (OpenAI/Gemini) or a bare `error` string (Ollama) out
/// of a provider error body.
pub(crate) fn extract_error_message(body: &str) -> Option<String> {
  let v: serde_json::Value = serde_json::from_str(body).ok()?;
  match v.get("error")? {
    serde_json::Value::String(s) => Some(s.clone()),
    obj => obj.get("message").and_then(|m| m.as_str()).map(str::to_string),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn provider_names_parse_case_insensitively() {
    assert_eq!("OpenAI".parse::<AiProvider>().unwrap(), AiProvider::OpenAi);
    assert_eq!(" gemini ".parse::<AiProvider>().unwrap(), AiProvider::Gemini);
    assert_eq!("local".parse::<AiProvider>().unwrap(), AiProvider::Ollama);
    assert!(matches!("claude".parse::<AiProvider>(), Err(AiError::UnknownProvider(_))));
  }

  #[test]
  fn provider_serializes_to_config_name() {
    assert_eq!(serde_json::to_string(&AiProvider::OpenAi).unwrap(), "\"openai\"");
    let p: AiProvider = serde_json::from_str("\"ollama\"").unwrap();
    assert_eq!(p, AiProvider::Ollama);
  }

  #[test]
  fn history_is_trimmed_to_the_most_recent_turns() {
    let history: Vec<ChatTurn> = (0..25)
      .map(|i| ChatTurn { role: ChatRole::User, content: i.to_string() })
      .collect();
    let kept = recent_history(&history);
    assert_eq!(kept.len(), MAX_HISTORY_TURNS);
    assert_eq!(kept[0].content, "5");
    assert_eq!(recent_history(&history[..3]).len(), 3);
  }

  #[test]
  fn error_message_extraction_handles_both_shapes() {
    assert_eq!(
      extract_error_message(r#"{"error":{"message":"bad key","type":"invalid"}}"#).as_deref(),
      Some("bad key")
    );
    assert_eq!(extract_error_message(r#"{"error":"model not found"}"#).as_deref(), Some("model not found"));
    assert_eq!(extract_error_message("<html>"), None);
  }

  #[tokio::test]
  async fn hosted_providers_without_keys_fail_before_any_request() {
    let assistant = Assistant::from_settings(&AiSettings::default());
    assert!(!assistant.is_configured(AiProvider::OpenAi));
    assert!(assistant.is_configured(AiProvider::Ollama));

    let err = assistant.complete(AiProvider::OpenAi, "sys", &[], "hi").await.unwrap_err();
    assert!(matches!(err, AiError::NotConfigured("OPENAI_API_KEY")));
    let err = assistant.complete(AiProvider::Gemini, "sys", &[], "hi").await.unwrap_err();
    assert!(matches!(err, AiError::NotConfigured("GEMINI_API_KEY")));
  }
}
