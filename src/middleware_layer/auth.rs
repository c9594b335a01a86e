use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::{error::LOGIN_PATH, state::AppState};

/// Name of the cookie carrying the browser session id.
pub const SESSION_COOKIE: &str = "auth_token";

/// Extracts the session id from the request cookies.
///
/// # Arguments
///
/// * `cookies` - The request cookies.
///
/// # Returns
///
/// An `Option` containing the session ID if found.
pub fn extract_session_id(cookies: &Cookies) -> Option<Uuid> {
    cookies
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// Expires the session cookie in the browser.
pub fn clear_session_cookie(cookies: &Cookies) {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookies.remove(cookie);
}

/// A middleware that requires a valid session. Requests without one are
/// redirected to the login page before the protected handler runs.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `cookies` - The request cookies.
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// The handler's `Response`, or a redirect to the login page.
pub async fn require_session(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    tracing::debug!("🔐 Checking session for {}", request.uri().path());

    let Some(session_id) = extract_session_id(&cookies) else {
        tracing::debug!("❌ No {} cookie found", SESSION_COOKIE);
        return Redirect::to(LOGIN_PATH).into_response();
    };

    match state.sessions.get(session_id).await {
        Ok(Some(entry)) => {
            tracing::debug!("✅ Session valid: {}", session_id);
            request.extensions_mut().insert(entry);
            next.run(request).await
        }
        Ok(None) => {
            tracing::warn!("❌ Unknown or signed-out session: {}", session_id);
            clear_session_cookie(&cookies);
            Redirect::to(LOGIN_PATH).into_response()
        }
        Err(e) => e.into_response(),
    }
}
