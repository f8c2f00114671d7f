//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to the assistant logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::error::{AppError, AI_FAILURE_MESSAGE, INTERNAL_MESSAGE};
use crate::logic::{self, AssistantReply};
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "lingua_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "lingua_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "lingua_backend", kind = kind_of(&incoming), "WS received");
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "lingua_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "lingua_backend", "WebSocket disconnected");
}

fn kind_of(msg: &ClientWsMessage) -> &'static str {
  match msg {
    ClientWsMessage::Ping => "ping",
    ClientWsMessage::Explain { .. } => "explain",
    ClientWsMessage::Chat { .. } => "chat",
  }
}

pub(crate) async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  let result = match msg {
    ClientWsMessage::Ping => return ServerWsMessage::Pong,
    ClientWsMessage::Explain { text, language, provider } => {
      logic::explain(state, &text, language.as_deref(), provider.as_deref()).await
    }
    ClientWsMessage::Chat { message, history, provider } => {
      logic::chat(state, &message, &history, provider.as_deref()).await
    }
  };
  to_ws_reply(result)
}

/// Same message policy as the HTTP error bodies: client mistakes are echoed,
/// provider and server failures are logged and replaced.
fn to_ws_reply(result: Result<AssistantReply, AppError>) -> ServerWsMessage {
  match result {
    Ok(reply) => ServerWsMessage::Reply { text: reply.text, provider: reply.provider.to_string() },
    Err(AppError::Ai(e)) => {
      error!(target: "ai", error = %e, "WS assistant call failed");
      ServerWsMessage::Error { message: AI_FAILURE_MESSAGE.into() }
    }
    Err(e @ (AppError::BadRequest(_) | AppError::NotFound(_) | AppError::Unauthorized(_))) => {
      ServerWsMessage::Error { message: e.to_string() }
    }
    Err(e) => {
      error!(target: "lingua_backend", error = %e, "WS request failed");
      ServerWsMessage::Error { message: INTERNAL_MESSAGE.into() }
    }
  }
}
