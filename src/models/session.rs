use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroizing;

/// A browser session known to the dashboard.
///
/// The bearer tokens never leave the server: the browser only holds the
/// session id in the `auth_token` cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The session id carried by the cookie.
    pub id: Uuid,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the session expires.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(duration_days: i64) -> Self {
        let created_at = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at,
            expires_at: created_at + chrono::Duration::days(duration_days),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Access and refresh token pair issued by `/api/token/`.
#[derive(Clone)]
pub struct Credentials {
    pub access: Zeroizing<String>,
    pub refresh: Zeroizing<String>,
}

impl Credentials {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: Zeroizing::new(access.into()),
            refresh: Zeroizing::new(refresh.into()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// Whether the session currently holds usable credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    Authenticated,
    Unauthenticated,
}
