//! Application state shared by every handler: the SQLite pool, the assistant
//! (provider clients), prompts, the JWT service and the settings they came from.

use sqlx::SqlitePool;
use tracing::{info, instrument};

use crate::ai::{AiProvider, Assistant};
use crate::auth::JwtService;
use crate::config::{load_agent_config_from_env, Prompts, Settings};
use crate::db;
use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub assistant: Assistant,
    pub prompts: Prompts,
    pub jwt: JwtService,
    pub settings: Settings,
}

impl AppState {
    /// Connect to the configured database, create the schema, load prompt
    /// overrides from AGENT_CONFIG_PATH and build the provider clients.
    #[instrument(level = "info", skip_all)]
    pub async fn new(settings: Settings) -> Result<Self, AppError> {
        let pool = db::connect(&settings.database_url).await?;
        db::migrate(&pool).await?;
        let prompts = load_agent_config_from_env()
            .map(|c| c.prompts)
            .unwrap_or_default();
        Ok(Self::with_pool(settings, pool, prompts))
    }

    /// Assemble state around an existing (already migrated) pool.
    pub fn with_pool(settings: Settings, pool: SqlitePool, prompts: Prompts) -> Self {
        let assistant = Assistant::from_settings(&settings.ai);
        let provider = assistant.default_provider;
        if assistant.is_configured(provider) {
            info!(target: "ai", %provider, model = %assistant.model_for(provider), "Assistant enabled");
        } else {
            info!(target: "ai", %provider, "Assistant provider has no API key; AI endpoints will return errors");
        }
        for other in [AiProvider::OpenAi, AiProvider::Gemini, AiProvider::Ollama] {
            if other != provider && assistant.is_configured(other) {
                info!(target: "ai", provider = %other, "Alternate provider available on request");
            }
        }

        Self {
            jwt: JwtService::new(&settings.jwt_secret, settings.jwt_ttl_hours),
            db: pool,
            assistant,
            prompts,
            settings,
        }
    }
}
