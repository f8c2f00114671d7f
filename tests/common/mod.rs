#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use lingua_backend::{
    build_router,
    config::{Prompts, Settings},
    db,
    seeds::{self, SeedMode},
    telemetry, AppState,
};

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
}

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

/// Settings with cheap bcrypt and no provider credentials.
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.bcrypt_cost = 4;
    settings.jwt_secret = "integration-test-secret".into();
    settings.ai.openai_api_key = None;
    settings.ai.gemini_api_key = None;
    settings
}

/// Fresh in-memory database seeded from `data/courses.json`.
pub async fn create_test_app() -> TestApp {
    telemetry::init_test_tracing();

    let pool = db::connect_in_memory().await.expect("in-memory sqlite");
    db::migrate(&pool).await.expect("schema");
    let fixtures = seeds::load_fixtures(&fixtures_dir()).expect("fixtures");
    seeds::seed(&pool, &fixtures, SeedMode::Upsert).await.expect("seed");

    let state = Arc::new(AppState::with_pool(test_settings(), pool, Prompts::default()));
    TestApp { router: build_router(state.clone()), state }
}

impl TestApp {
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body), None).await
    }

    /// Register and log in; returns the bearer token.
    pub async fn sign_up(&self, email: &str) -> String {
        let (status, _) = self
            .post("/api/v1/auth/register", json!({ "email": email, "password": "correct-horse", "name": "Test Learner" }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = self
            .post("/api/v1/auth/login", json!({ "email": email, "password": "correct-horse" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        body["accessToken"].as_str().unwrap().to_string()
    }

    /// Id of the lesson at `order` in the (language, level) course.
    pub async fn lesson_id(&self, language: &str, level: &str, order: i64) -> i64 {
        let (_, body) = self.get(&format!("/api/v1/courses/{language}/{level}")).await;
        body["lessons"]
            .as_array()
            .unwrap()
            .iter()
            .find(|l| l["order"] == order)
            .and_then(|l| l["id"].as_i64())
            .unwrap()
    }
}
