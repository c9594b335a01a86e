use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};
use zeroize::Zeroizing;

use crate::{
    error::Result,
    handlers::response::json_response,
    middleware_layer::auth::{SESSION_COOKIE, clear_session_cookie},
    services::registry::RegisteredSession,
    state::AppState,
    validation::auth::*,
};

/// The request payload for user login.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: Zeroizing<String>,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The response payload for authentication-related requests.
#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct SessionInfo {
    pub authenticated: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Creates the session cookie.
///
/// # Arguments
///
/// * `value` - The session id.
/// * `max_age_days` - Lifetime of the cookie in days.
/// * `secure` - Whether the cookie is only sent over HTTPS.
fn create_session_cookie(value: String, max_age_days: i64, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, value);

    cookie.set_http_only(true);
    if secure {
        cookie.set_secure(true);
    }

    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(Duration::seconds(max_age_days * 86400));
    cookie.set_path("/");

    cookie
}

/// Handles user login.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    tracing::info!("🔐 Login attempt - Payload: {:?}", payload);
    validate_username(&payload.username)?;
    validate_password(&payload.password)?;

    let entry = state.sessions.create().await;
    let session_id = entry.session.id;
    tracing::debug!("🔑 Generated session_id: {}", session_id);

    let client = state.api.for_session(entry.state.clone());
    if let Err(e) = client.login(&payload.username, &payload.password).await {
        tracing::warn!("❌ Login failed for {}: {}", payload.username, e);
        state.sessions.remove(session_id).await;
        return Err(e);
    }

    cookies.add(create_session_cookie(
        session_id.to_string(),
        state.config.session_duration_days,
        state.config.secure_cookies,
    ));
    tracing::info!("✅ Session cookie added: {}={}", SESSION_COOKIE, session_id);

    let response = AuthResponse {
        success: true,
        message: "Login successful".to_string(),
    };

    json_response(StatusCode::OK, &response)
}

/// Handles user logout.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(entry): Extension<RegisteredSession>,
    cookies: Cookies,
) -> Result<Response> {
    let session_id = entry.session.id;
    tracing::info!("👋 Logout for session: {}", session_id);

    state.api.for_session(entry.state.clone()).logout().await;
    state.sessions.remove(session_id).await;
    clear_session_cookie(&cookies);

    tracing::info!("✅ Session ended: {}", session_id);

    let response = AuthResponse {
        success: true,
        message: "Logout successful".to_string(),
    };

    json_response(StatusCode::OK, &response)
}

/// Reports the current session.
pub async fn session_info(Extension(entry): Extension<RegisteredSession>) -> Result<Response> {
    let info = SessionInfo {
        authenticated: entry.state.is_authenticated(),
        created_at: entry.session.created_at,
        expires_at: entry.session.expires_at,
    };

    json_response(StatusCode::OK, &info)
}
