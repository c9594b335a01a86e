use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Path the shell sends the browser to when the session is gone.
pub const LOGIN_PATH: &str = "/login";

/// Errors raised by the authenticated upstream client.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The session could not be (re)authenticated. The tokens are already
    /// cleared when this is returned.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// No response was received (connection failure or timeout).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The upstream answered with a non-success status.
    #[error("Upstream responded with status {status}")]
    Http {
        status: StatusCode,
        body: serde_json::Value,
    },
}

impl ApiError {
    /// Whether this error ended the session.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth(_))
    }
}

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// An upstream API error.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// An authentication error.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// An authorization error.
    #[error("Authorization failed")]
    Unauthorized,

    /// A resource not found error.
    #[error("Resource not found")]
    NotFound,

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    upstream_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    upstream_body: Option<serde_json::Value>,
}

impl ErrorBody {
    fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            redirect: None,
            upstream_status: None,
            upstream_body: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Redis(ref e) => {
                tracing::error!("Redis error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::message("Session storage error"),
                )
            }

            AppError::Api(ApiError::Auth(ref msg)) => {
                tracing::warn!("Session ended: {}", msg);
                let mut body = ErrorBody::message(msg.clone());
                body.redirect = Some(LOGIN_PATH);
                (StatusCode::UNAUTHORIZED, body)
            }

            AppError::Api(ApiError::Network(ref e)) => {
                tracing::error!("Upstream unreachable: {}", e);
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    ErrorBody::message("No response received from server"),
                )
            }

            AppError::Api(ApiError::Http { status, body: upstream }) => {
                tracing::warn!("Upstream error status: {}", status);
                let mut body = ErrorBody::message(format!("Upstream responded with status {}", status));
                body.upstream_status = Some(status.as_u16());
                body.upstream_body = Some(upstream);
                (StatusCode::BAD_GATEWAY, body)
            }

            AppError::Authentication(ref msg) => {
                tracing::warn!("Authentication failed: {}", msg);
                (StatusCode::UNAUTHORIZED, ErrorBody::message(msg.clone()))
            }

            AppError::Unauthorized => {
                tracing::warn!("Authorization failed");
                let mut body = ErrorBody::message("Unauthorized");
                body.redirect = Some(LOGIN_PATH);
                (StatusCode::UNAUTHORIZED, body)
            }

            AppError::NotFound => {
                tracing::debug!("Resource not found");
                (StatusCode::NOT_FOUND, ErrorBody::message("Resource not found"))
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, ErrorBody::message(msg.clone()))
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::message("Internal server error"),
                )
            }
        };

        let body = sonic_rs::to_string(&body)
            .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
    }
}
