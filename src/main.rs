//! Lingua · Multi-language Learning Backend
//!
//! - Axum HTTP + WebSocket API over a SQLite content store
//! - Assistant backed by OpenAI, Gemini or Ollama (via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT              : u16 (default 3000)
//!   DATABASE_URL      : default "sqlite:lingua.db?mode=rwc"
//!   JWT_SECRET        : signing secret for bearer tokens
//!   SEED_DATA_DIR     : upsert fixtures from this directory at startup
//!   AI_PROVIDER       : "openai" (default), "gemini" or "ollama"
//!   OPENAI_API_KEY / GEMINI_API_KEY : provider credentials
//!   AGENT_CONFIG_PATH : path to TOML config (prompt overrides)
//!   LOG_LEVEL         : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT        : "pretty" (default) or "json"

use std::{net::SocketAddr, path::Path, sync::Arc};

use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

use lingua_backend::config::Settings;
use lingua_backend::seeds::{self, SeedMode};
use lingua_backend::{build_router, telemetry, AppState};

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  // .env first so LOG_LEVEL / LOG_FORMAT from it reach the subscriber.
  dotenvy::dotenv().ok();
  telemetry::init_tracing();
  let settings = Settings::from_env();

  // Pool, schema, provider clients, prompts.
  let state = Arc::new(AppState::new(settings.clone()).await?);

  if let Some(dir) = settings.seed_data_dir.as_deref() {
    match seeds::load_fixtures(Path::new(dir)) {
      Ok(fixtures) => {
        let report = seeds::seed(&state.db, &fixtures, SeedMode::Upsert).await?;
        info!(target: "lingua_backend", %dir, ?report, "Startup seed applied");
      }
      Err(e) => warn!(target: "lingua_backend", %dir, error = %e, "Skipping startup seed"),
    }
  }

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "lingua_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "lingua_backend", error = %e, "Could not listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
  info!(target: "lingua_backend", "Shutdown requested");
}
