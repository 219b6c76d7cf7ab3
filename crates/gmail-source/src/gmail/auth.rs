//! Gmail OAuth2 authentication
//!
//! Exchanges the configured refresh token for short-lived access tokens.
//! The access token is cached in memory for the lifetime of the instance
//! and refreshed shortly before it expires.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use anyhow::Result;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Mutex;

use super::http_agent;
use crate::error::SourceError;

/// Cached access token
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Option<i64>,
}

impl CachedToken {
    /// Valid with a safety margin before expiry
    fn is_fresh(&self, now: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at > now + GmailAuth::EXPIRY_MARGIN_SECS,
            None => false,
        }
    }
}

/// Token response from Google
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
    #[allow(dead_code)]
    token_type: Option<String>,
}

/// OAuth2 credentials and token cache for Gmail
pub struct GmailAuth {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    cached: Mutex<Option<CachedToken>>,
}

impl GmailAuth {
    const TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";

    /// Read-only access is all the connector needs
    pub const GMAIL_READONLY_SCOPE: &'static str =
        "https://www.googleapis.com/auth/gmail.readonly";

    /// Refresh this long before the reported expiry
    const EXPIRY_MARGIN_SECS: i64 = 300;

    /// Create a new GmailAuth instance; no network call is made until a
    /// token is first requested
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            cached: Mutex::new(None),
        }
    }

    /// Get a valid access token, refreshing if needed
    pub fn get_access_token(&self) -> Result<String> {
        let now = Utc::now().timestamp();

        if let Ok(guard) = self.cached.lock()
            && let Some(token) = guard.as_ref()
            && token.is_fresh(now)
        {
            return Ok(token.access_token.clone());
        }

        log::debug!("Refreshing Gmail access token");
        let response = self.refresh_access_token()?;
        let token = CachedToken {
            access_token: response.access_token,
            expires_at: response.expires_in.map(|secs| now + secs as i64),
        };

        let access_token = token.access_token.clone();
        if let Ok(mut guard) = self.cached.lock() {
            *guard = Some(token);
        }
        Ok(access_token)
    }

    /// Whether an unexpired token is cached
    pub fn has_fresh_token(&self) -> bool {
        let now = Utc::now().timestamp();
        self.cached
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|t| t.is_fresh(now)))
            .unwrap_or(false)
    }

    /// Drop the cached token so the next request refreshes
    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.cached.lock() {
            *guard = None;
        }
    }

    /// Exchange the refresh token for a new access token
    fn refresh_access_token(&self) -> Result<TokenResponse> {
        let response = http_agent().post(Self::TOKEN_URL).send_form([
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
            ("scope", Self::GMAIL_READONLY_SCOPE),
        ]);

        let response = match response {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(code @ (400 | 401))) => {
                return Err(SourceError::config(
                    "Google rejected the OAuth credentials. Please check your client ID, client secret and refresh token.",
                    format!("token refresh failed with HTTP {}", code),
                )
                .into());
            }
            Err(e) => {
                return Err(SourceError::system(
                    "Failed to refresh the Gmail access token.",
                    format!("token refresh failed: {}", e),
                )
                .into());
            }
        };

        let token: TokenResponse = response.into_body().read_json().map_err(|e| {
            SourceError::system(
                "Failed to refresh the Gmail access token.",
                format!("failed to parse token response: {}", e),
            )
        })?;

        Ok(token)
    }
}

impl std::fmt::Debug for GmailAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GmailAuth")
            .field("client_id", &"<redacted>")
            .field("has_fresh_token", &self.has_fresh_token())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_token_freshness() {
        let now = 1_700_000_000;
        let token = CachedToken {
            access_token: "ya29".to_string(),
            expires_at: Some(now + 3600),
        };
        assert!(token.is_fresh(now));

        let expiring = CachedToken {
            access_token: "ya29".to_string(),
            expires_at: Some(now + 120),
        };
        assert!(!expiring.is_fresh(now));

        let unknown = CachedToken {
            access_token: "ya29".to_string(),
            expires_at: None,
        };
        assert!(!unknown.is_fresh(now));
    }

    #[test]
    fn test_new_is_lazy() {
        let auth = GmailAuth::new("id", "secret", "refresh");
        assert!(!auth.has_fresh_token());
        auth.invalidate();
        assert!(!auth.has_fresh_token());
    }

    #[test]
    fn test_debug_redacts() {
        let auth = GmailAuth::new("id", "secret", "refresh");
        let debug = format!("{:?}", auth);
        assert!(!debug.contains("secret"));
    }
}
