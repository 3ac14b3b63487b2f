//! Access tokens and the static credential.

use super::{AuthError, TokenCredential};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

/// Refresh tokens this many seconds before they expire.
const REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// A bearer token with an optional expiry.
#[derive(Clone)]
pub struct AccessToken {
    secret: String,
    expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl AccessToken {
    pub fn new(secret: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            secret: secret.into(),
            expires_at,
        }
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Check if the token expires within the refresh margin.
    ///
    /// Tokens without an expiry never need refresh.
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh_at(Utc::now())
    }

    #[must_use]
    pub fn needs_refresh_at(&self, now: DateTime<Utc>) -> bool {
        let Some(expires_at) = self.expires_at else {
            return false;
        };
        expires_at - now < Duration::seconds(REFRESH_MARGIN_SECS)
    }
}

/// Credential that always returns the same token.
///
/// Useful against local mocks and authenticating proxies.
pub struct StaticTokenCredential {
    token: AccessToken,
}

impl StaticTokenCredential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(secret, None),
        }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    fn name(&self) -> &'static str {
        "static token"
    }

    async fn get_token(&self, _scope: &str) -> Result<AccessToken, AuthError> {
        if self.token.secret.is_empty() {
            return Err(AuthError::InvalidToken {
                source_name: self.name(),
                reason: "token is empty".into(),
            });
        }
        Ok(self.token.clone())
    }
}
