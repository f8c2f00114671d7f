//! Minimal OpenAI client: chat.completions with plain-text replies.
//!
//! Calls are instrumented and log model names, latencies and token usage (not contents).
//!
//! NOTE: We never log the API key.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::{extract_error_message, AiError, AiProvider, ChatRole, ChatTurn};

#[derive(Clone)]
pub struct OpenAI {
  client: reqwest::Client,
  pub api_key: Option<String>,
  pub base_url: String,
  pub model: String,
}

impl OpenAI {
  pub fn new(client: reqwest::Client, api_key: Option<String>, base_url: &str, model: &str) -> Self {
    Self {
      client,
      api_key,
      base_url: base_url.trim_end_matches('/').to_string(),
      model: model.to_string(),
    }
  }

  #[instrument(level = "info", target = "ai", skip(self, system, history, user), fields(model = %self.model))]
  pub async fn chat(
    &self,
    system: &str,
    history: &[ChatTurn],
    user: &str,
    temperature: f32,
  ) -> Result<String, AiError> {
    let api_key = self.api_key.as_deref().ok_or(AiError::NotConfigured("OPENAI_API_KEY"))?;
    let url = format!("{}/chat/completions", self.base_url);
    let req = build_request(&self.model, system, history, user, temperature);

    let res = self.client.post(&url)
      .header(USER_AGENT, concat!("lingua-backend/", env!("CARGO_PKG_VERSION")))
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", api_key))
      .json(&req).send().await?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let message = extract_error_message(&body).unwrap_or(body);
      return Err(AiError::HttpStatus { provider: AiProvider::OpenAi, status, message });
    }

    let body: ChatCompletionResponse = res.json().await?;
    if let Some(usage) = &body.usage {
      info!(target: "ai", prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    Ok(first_choice_text(&body))
  }
}

fn build_request(model: &str, system: &str, history: &[ChatTurn], user: &str, temperature: f32) -> ChatCompletionRequest {
  let mut messages = Vec::with_capacity(history.len() + 2);
  messages.push(ChatMessageReq { role: "system".into(), content: system.into() });
  for turn in history {
    let role = match turn.role {
      ChatRole::User => "user",
      ChatRole::Assistant => "assistant",
    };
    messages.push(ChatMessageReq { role: role.into(), content: turn.content.clone() });
  }
  messages.push(ChatMessageReq { role: "user".into(), content: user.into() });

  ChatCompletionRequest { model: model.to_string(), messages, temperature, max_tokens: None }
}

fn first_choice_text(body: &ChatCompletionResponse) -> String {
  body.choices.first()
    .and_then(|c| c.message.content.clone())
    .unwrap_or_default()
    .trim()
    .to_string()
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}
