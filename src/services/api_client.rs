use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode, header};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    error::{ApiError, AppError, Result},
    models::session::Credentials,
    services::session::SessionState,
};

/// Login endpoint: `{username, password}` → `{access, refresh}`.
pub const TOKEN_PATH: &str = "/api/token/";
/// Refresh endpoint: `{refresh}` → `{access}`.
pub const REFRESH_PATH: &str = "/api/token/refresh/";

/// How request parameters travel.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Query(Vec<(String, String)>),
    Json(Value),
}

#[derive(Deserialize)]
struct TokenPair {
    access: Option<String>,
    refresh: Option<String>,
}

#[derive(Deserialize)]
struct RefreshedToken {
    access: Option<String>,
}

/// Upstream REST client bound to one session.
///
/// Every request carries the session's access token. A 401 triggers one
/// refresh of the access token and one retry; a second 401, or a failed
/// refresh, ends the session.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionState>,
}

impl ApiClient {
    /// Creates a client with a fixed request timeout.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the upstream API.
    /// * `timeout` - Timeout for each request, refresh calls included.
    /// * `session` - The session whose tokens are used.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `ApiClient`.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        session: Arc<SessionState>,
    ) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Internal(format!("HTTP client setup failed: {}", e)))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::info!("✅ API client targeting {}", base_url);

        Ok(Self { http, base_url, session })
    }

    /// The same connection pool, bound to another session.
    pub fn for_session(&self, session: Arc<SessionState>) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            session,
        }
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Issues an authenticated request and returns the parsed body.
    ///
    /// # Arguments
    ///
    /// * `method` - The HTTP method.
    /// * `path` - Path relative to the base URL, or an absolute URL.
    /// * `payload` - Query pairs or JSON body.
    ///
    /// # Returns
    ///
    /// The parsed JSON body (`null` when empty), or `ApiError`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        payload: &Payload,
    ) -> std::result::Result<Value, ApiError> {
        let mut retried = false;

        loop {
            tracing::debug!("➡️ {} {} (retry: {})", method, path, retried);

            let response = self.dispatch(&method, path, payload).await.map_err(|e| {
                tracing::error!("❌ No response received for {} {}: {}", method, path, e);
                e
            })?;

            if response.status() != StatusCode::UNAUTHORIZED {
                return read_body(response).await;
            }

            if retried {
                tracing::warn!("❌ {} {} still unauthorized after refresh", method, path);
                self.session.terminate().await;
                return Err(ApiError::Auth(
                    "Request rejected after token refresh".to_string(),
                ));
            }

            tracing::debug!("🔄 {} {} unauthorized, refreshing access token", method, path);
            retried = true;
            self.refresh().await?;
        }
    }

    pub async fn get(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> std::result::Result<Value, ApiError> {
        self.request(Method::GET, path, &Payload::Query(query)).await
    }

    pub async fn post(&self, path: &str, body: Value) -> std::result::Result<Value, ApiError> {
        self.request(Method::POST, path, &Payload::Json(body)).await
    }

    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        payload: &Payload,
    ) -> std::result::Result<reqwest::Response, ApiError> {
        let mut builder = self.http.request(method.clone(), self.url(path));

        builder = match payload {
            Payload::Query(pairs) => builder.query(pairs),
            Payload::Json(body) => builder.json(body),
        };

        if let Some(token) = self.session.access_token().await {
            builder = builder.bearer_auth(token.as_str());
        }

        Ok(builder.send().await?)
    }

    /// Exchanges the stored refresh token for a new access token.
    ///
    /// Any failure ends the session and yields `ApiError::Auth`.
    pub async fn refresh(&self) -> std::result::Result<(), ApiError> {
        let outcome = match self.session.refresh_token().await {
            Some(refresh) => self.request_access_token(&refresh).await,
            None => Err("No refresh token stored".to_string()),
        };

        let access = match outcome {
            Ok(access) => access,
            Err(reason) => {
                tracing::warn!("❌ Token refresh failed: {}", reason);
                self.session.terminate().await;
                return Err(ApiError::Auth(reason));
            }
        };

        if let Err(e) = self.session.replace_access(access).await {
            tracing::warn!("❌ Could not store refreshed token: {}", e);
            self.session.terminate().await;
            return Err(ApiError::Auth(format!("Could not store refreshed token: {}", e)));
        }

        tracing::info!("✅ Access token refreshed");
        Ok(())
    }

    async fn request_access_token(&self, refresh: &str) -> std::result::Result<String, String> {
        let response = self
            .http
            .post(self.url(REFRESH_PATH))
            .json(&json!({ "refresh": refresh }))
            .send()
            .await
            .map_err(|e| format!("Refresh request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("Refresh rejected with status {}", status));
        }

        let token: RefreshedToken = response
            .json()
            .await
            .map_err(|e| format!("Malformed refresh response: {}", e))?;

        token
            .access
            .filter(|access| !access.is_empty())
            .ok_or_else(|| "Refresh response carried no access token".to_string())
    }

    /// Logs in upstream and establishes the session with the issued pair.
    ///
    /// Bad credentials are not a session expiry: they surface as
    /// `AppError::Authentication` without any refresh attempt.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url(TOKEN_PATH))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .map_err(ApiError::from)?;

        let body = match read_body(response).await {
            Ok(body) => body,
            Err(ApiError::Http { status, body })
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::BAD_REQUEST =>
            {
                return Err(AppError::Authentication(login_failure_message(&body)));
            }
            Err(e) => return Err(e.into()),
        };

        let pair: TokenPair = serde_json::from_value(body)
            .map_err(|e| AppError::Internal(format!("Malformed token response: {}", e)))?;

        let (Some(access), Some(refresh)) = (pair.access, pair.refresh) else {
            return Err(AppError::Internal(
                "Token response is missing access or refresh token".to_string(),
            ));
        };

        self.session.establish(Credentials::new(access, refresh)).await?;
        tracing::info!("✅ User logged in upstream: {}", username);
        Ok(())
    }

    /// Ends the session locally.
    pub async fn logout(&self) {
        self.session.terminate().await;
    }
}

/// Parses a response body: JSON when possible, raw text otherwise, `null`
/// when empty. Non-success statuses become `ApiError::Http`.
async fn read_body(response: reqwest::Response) -> std::result::Result<Value, ApiError> {
    let status = response.status();
    let text = response.text().await?;

    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };

    if status.is_success() {
        Ok(body)
    } else {
        tracing::warn!("⚠️ API error: status={} body={}", status, body);
        Err(ApiError::Http { status, body })
    }
}

/// The upstream's `detail` or `message`, like the login form shows.
fn login_failure_message(body: &Value) -> String {
    body.get("detail")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| "Invalid username or password".to_string())
}
