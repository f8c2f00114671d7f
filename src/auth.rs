//! Accounts: bcrypt password hashing, JWT bearer tokens, and the extractors
//! that turn an `Authorization: Bearer …` header into the calling user.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::db::{self, users};
use crate::domain::User;
use crate::error::AppError;
use crate::state::AppState;

pub const DUPLICATE_EMAIL_MESSAGE: &str = "Email already exists";
const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtService {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            iat: now.timestamp() as usize,
            exp: (now + self.ttl).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("token encoding failed: {e}")))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default()).map(|data| data.claims)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: User,
}

/// Create an account. A taken email is a 400 with "Email already exists",
/// including when two registrations race past the existence check.
#[instrument(level = "info", target = "auth", skip(state, req), fields(email = %req.email))]
pub async fn register(state: &AppState, mut req: RegisterRequest) -> Result<User, AppError> {
    req.name = req.name.trim().to_string();
    req.email = req.email.trim().to_lowercase();
    req.validate()?;
    let email = req.email.as_str();

    if users::find_by_email(&state.db, email).await?.is_some() {
        warn!(target: "auth", "Registration rejected: email taken");
        return Err(AppError::bad_request(DUPLICATE_EMAIL_MESSAGE));
    }

    let password_hash = bcrypt::hash(&req.password, state.settings.bcrypt_cost)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;

    match users::insert(&state.db, email, &req.name, &password_hash).await {
        Ok(user) => {
            info!(target: "auth", user_id = %user.id, "User registered");
            Ok(user)
        }
        Err(e) if db::is_unique_violation(&e) => Err(AppError::bad_request(DUPLICATE_EMAIL_MESSAGE)),
        Err(e) => Err(e.into()),
    }
}

#[instrument(level = "info", target = "auth", skip(state, req), fields(email = %req.email))]
pub async fn login(state: &AppState, req: LoginRequest) -> Result<LoginResponse, AppError> {
    req.validate()?;
    let email = req.email.trim().to_lowercase();

    let user = users::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS_MESSAGE))?;

    let ok = bcrypt::verify(&req.password, &user.password_hash).unwrap_or(false);
    if !ok {
        warn!(target: "auth", "Login rejected: bad password");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS_MESSAGE));
    }

    let access_token = state.jwt.issue(&user)?;
    info!(target: "auth", user_id = %user.id, "User logged in");
    Ok(LoginResponse { access_token, token_type: "Bearer", user })
}

/// The authenticated caller. Rejects with 401 when the token is missing,
/// invalid, expired, or names a user that no longer exists.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
}

/// Like `CurrentUser`, but absent instead of rejected.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn resolve(state: &AppState, token: &str) -> Result<CurrentUser, AppError> {
    let claims = state.jwt.validate(token).map_err(|e| {
        debug!(target: "auth", error = %e, "JWT validation failed");
        AppError::unauthorized("Invalid or expired token")
    })?;
    let user = users::find_by_id(&state.db, &claims.sub)
        .await?
        .ok_or_else(|| AppError::unauthorized("Unknown user"))?;
    Ok(CurrentUser { id: user.id, email: user.email })
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| AppError::unauthorized("Missing authorization token"))?;
        resolve(state, token).await
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(MaybeUser(None));
        };
        match resolve(state, token).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(AppError::Unauthorized(_)) => Ok(MaybeUser(None)),
            Err(other) => Err(other),
        }
    }
}
