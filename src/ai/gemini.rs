//! Google Generative AI (Gemini) client: `models/{model}:generateContent`.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::{extract_error_message, AiError, AiProvider, ChatRole, ChatTurn};

#[derive(Clone)]
pub struct Gemini {
  client: reqwest::Client,
  pub api_key: Option<String>,
  pub base_url: String,
  pub model: String,
}

impl Gemini {
  pub fn new(client: reqwest::Client, api_key: Option<String>, base_url: &str, model: &str) -> Self {
    Self {
      client,
      api_key,
      base_url: base_url.trim_end_matches('/').to_string(),
      model: model.to_string(),
    }
  }

  #[instrument(level = "info", target = "ai", skip(self, system, history, user), fields(model = %self.model))]
  pub async fn generate(
    &self,
    system: &str,
    history: &[ChatTurn],
    user: &str,
    temperature: f32,
  ) -> Result<String, AiError> {
    let api_key = self.api_key.as_deref().ok_or(AiError::NotConfigured("GEMINI_API_KEY"))?;
    let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
    let req = build_request(system, history, user, temperature);

    // Header, not `?key=`: reqwest errors print the request URL.
    let res = self.client.post(&url)
      .header("x-goog-api-key", api_key)
      .json(&req)
      .send()
      .await?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let message = extract_error_message(&body).unwrap_or(body);
      return Err(AiError::HttpStatus { provider: AiProvider::Gemini, status, message });
    }

    let body: GenerateContentResponse = res.json().await?;
    if let Some(usage) = &body.usage_metadata {
      info!(target: "ai", prompt_tokens = ?usage.prompt_token_count, total_tokens = ?usage.total_token_count, "Gemini usage");
    }
    Ok(candidate_text(&body))
  }
}

fn build_request(system: &str, history: &[ChatTurn], user: &str, temperature: f32) -> GenerateContentRequest {
  let mut contents: Vec<Content> = history
    .iter()
    .map(|turn| Content {
      role: match turn.role {
        ChatRole::User => "user".into(),
        ChatRole::Assistant => "model".into(),
      },
      parts: vec![Part { text: turn.content.clone() }],
    })
    .collect();
  contents.push(Content { role: "user".into(), parts: vec![Part { text: user.into() }] });

  GenerateContentRequest {
    system_instruction: SystemInstruction { parts: vec![Part { text: system.into() }] },
    contents,
    generation_config: GenerationConfig { temperature },
  }
}

/// Concatenate the text parts of the first candidate.
fn candidate_text(body: &GenerateContentResponse) -> String {
  body.candidates.first()
    .and_then(|c| c.content.as_ref())
    .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect::<Vec<_>>().join(""))
    .unwrap_or_default()
    .trim()
    .to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
  system_instruction: SystemInstruction,
  contents: Vec<Content>,
  generation_config: GenerationConfig,
}
#[derive(Serialize)]
struct SystemInstruction { parts: Vec<Part> }
#[derive(Serialize)]
struct Content { role: String, parts: Vec<Part> }
#[derive(Serialize)]
struct Part { text: String }
#[derive(Serialize)]
struct GenerationConfig { temperature: f32 }

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
  #[serde(default)] candidates: Vec<Candidate>,
  #[serde(default)] usage_metadata: Option<UsageMetadata>,
}
#[derive(Deserialize)]
struct Candidate { #[serde(default)] content: Option<CandidateContent> }
#[derive(Deserialize)]
struct CandidateContent { #[serde(default)] parts: Vec<CandidatePart> }
#[derive(Deserialize)]
struct CandidatePart { #[serde(default)] text: Option<String> }
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
  #[serde(default)] prompt_token_count: Option<u32>,
  #[serde(default)] total_token_count: Option<u32>,
}
