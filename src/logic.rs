//! Assistant behaviors shared by both HTTP and WebSocket handlers.
//!
//!   - Explain: a word or sentence, in its language, with reading and grammar
//!   - Chat: free conversation with a coach, carrying recent history
//!
//! Both pick the provider named by the caller or fall back to the configured
//! default, and only log lengths (never prompt or reply text).

use tracing::{info, instrument, warn};

use crate::ai::{AiProvider, ChatTurn};
use crate::error::AppError;
use crate::state::AppState;
use crate::util::{fill_template, guess_language, trunc_for_log};

/// Reply text plus the provider that produced it.
#[derive(Debug)]
pub struct AssistantReply {
  pub text: String,
  pub provider: AiProvider,
}

/// The caller's explicit choice wins; an empty string counts as no choice.
pub fn resolve_provider(state: &AppState, requested: Option<&str>) -> Result<AiProvider, AppError> {
  match requested.map(str::trim).filter(|s| !s.is_empty()) {
    None => Ok(state.assistant.default_provider),
    Some(name) => name.parse::<AiProvider>().map_err(|_| {
      warn!(target: "ai", requested = %trunc_for_log(name, 32), "Unknown provider requested");
      AppError::bad_request(format!("Unknown AI provider '{name}'. Use openai, gemini or ollama"))
    }),
  }
}

#[instrument(level = "info", target = "ai", skip(state, text, language), fields(text_len = text.len(), ?provider))]
pub async fn explain(
  state: &AppState,
  text: &str,
  language: Option<&str>,
  provider: Option<&str>,
) -> Result<AssistantReply, AppError> {
  let text = text.trim();
  if text.is_empty() {
    return Err(AppError::bad_request("Text is required"));
  }
  let provider = resolve_provider(state, provider)?;
  let language = language
    .map(str::trim)
    .filter(|l| !l.is_empty())
    .unwrap_or_else(|| guess_language(text));

  let prompt = fill_template(
    &state.prompts.explain_user_template,
    &[("language", language), ("text", text)],
  );
  let reply = state
    .assistant
    .complete(provider, &state.prompts.explain_system, &[], &prompt)
    .await?;
  info!(target: "ai", %provider, %language, reply_len = reply.len(), "Explanation ready");
  Ok(AssistantReply { text: reply, provider })
}

#[instrument(level = "info", target = "ai", skip(state, message, history), fields(message_len = message.len(), history_len = history.len(), ?provider))]
pub async fn chat(
  state: &AppState,
  message: &str,
  history: &[ChatTurn],
  provider: Option<&str>,
) -> Result<AssistantReply, AppError> {
  let message = message.trim();
  if message.is_empty() {
    return Err(AppError::bad_request("Message is required"));
  }
  let provider = resolve_provider(state, provider)?;
  let reply = state
    .assistant
    .complete(provider, &state.prompts.chat_system, history, message)
    .await?;
  info!(target: "ai", %provider, reply_len = reply.len(), "Chat reply ready");
  Ok(AssistantReply { text: reply, provider })
}
