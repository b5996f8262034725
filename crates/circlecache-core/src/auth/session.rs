use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default international dialing code for phone logins
pub const DEFAULT_COUNTRY_CODE: &str = "1";

/// How the identifier passed to `authenticate` is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoginKind {
    Phone { country_code: String },
    Email,
}

impl Default for LoginKind {
    fn default() -> Self {
        LoginKind::Phone {
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
        }
    }
}

/// An authenticated session with the location-sharing provider.
///
/// Held in memory for the life of the process. Token expiry is not tracked
/// for renewal; `age()` is informational only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub token_type: String,
    pub access_token: String,
    pub identifier: String,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(token_type: String, access_token: String, identifier: &str) -> Self {
        Self {
            token_type,
            access_token,
            identifier: identifier.to_string(),
            created_at: Utc::now(),
        }
    }

    /// Value for the `Authorization` header, e.g. "Bearer abc123"
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.created_at
    }
}
