//! Local model server speaking the Ollama `/api/chat` protocol. No key.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{extract_error_message, AiError, AiProvider, ChatRole, ChatTurn};

#[derive(Clone)]
pub struct Ollama {
  client: reqwest::Client,
  pub base_url: String,
  pub model: String,
}

impl Ollama {
  pub fn new(client: reqwest::Client, base_url: &str, model: &str) -> Self {
    Self {
      client,
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
    let url = format!("{}/api/chat", self.base_url);
    let req = build_request(&self.model, system, history, user, temperature);

    let res = self.client.post(&url).json(&req).send().await?;
    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let message = extract_error_message(&body).unwrap_or(body);
      return Err(AiError::HttpStatus { provider: AiProvider::Ollama, status, message });
    }

    let body: OllamaChatResponse = res.json().await?;
    debug!(target: "ai", eval_count = ?body.eval_count, "Ollama reply");
    Ok(body.message.map(|m| m.content).unwrap_or_default().trim().to_string())
  }
}

fn build_request(model: &str, system: &str, history: &[ChatTurn], user: &str, temperature: f32) -> OllamaChatRequest {
  let mut messages = vec![OllamaMessage { role: "system".into(), content: system.into() }];
  messages.extend(history.iter().map(|t| OllamaMessage {
    role: match t.role {
      ChatRole::User => "user".into(),
      ChatRole::Assistant => "assistant".into(),
    },
    content: t.content.clone(),
  }));
  messages.push(OllamaMessage { role: "user".into(), content: user.into() });

  OllamaChatRequest {
    model: model.to_string(),
    messages,
    stream: false,
    options: OllamaOptions { temperature },
  }
}

#[derive(Serialize)]
struct OllamaChatRequest {
  model: String,
  messages: Vec<OllamaMessage>,
  stream: bool,
  options: OllamaOptions,
}
#[derive(Serialize, Deserialize)]
struct OllamaMessage { role: String, content: String }
#[derive(Serialize)]
struct OllamaOptions { temperature: f32 }

#[derive(Deserialize)]
struct OllamaChatResponse {
  #[serde(default)] message: Option<OllamaMessage>,
  #[serde(default)] eval_count: Option<u64>,
}
