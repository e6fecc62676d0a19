use anyhow::{Context, Result};
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::models::{parse_expires_in, RefreshResponse};
use crate::session::AuthenticatedUser;

/// Refresh this many seconds before the id token expires.
const REFRESH_MARGIN_SECS: i64 = 60;

struct CachedToken {
    id_token: String,
    refresh_token: String,
    /// Unix timestamp (seconds) when `id_token` expires
    expires_at: i64,
}

/// Hands out a valid id token for one signed-in user, refreshing it through
/// the Secure Token API when it is about to expire.
pub struct TokenSource {
    http: Client,
    token_url: String,
    api_key: String,
    token: Mutex<CachedToken>,
}

impl TokenSource {
    pub fn new(http: Client, token_url: &str, api_key: &str, user: &AuthenticatedUser) -> Self {
        Self {
            http,
            token_url: token_url.to_owned(),
            api_key: api_key.to_owned(),
            token: Mutex::new(CachedToken {
                id_token: user.id_token.clone(),
                refresh_token: user.refresh_token.clone(),
                expires_at: user.expires_at,
            }),
        }
    }

    /// Returns a valid id token, refreshing it if necessary.
    pub async fn id_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        let now = chrono::Utc::now().timestamp();

        if !needs_refresh(guard.expires_at, now) {
            return Ok(guard.id_token.clone());
        }

        info!("Refreshing Firebase id token");
        let fresh = self.refresh(&guard.refresh_token).await?;
        let expires_in = parse_expires_in(&fresh.expires_in)?;

        guard.id_token = fresh.id_token;
        guard.refresh_token = fresh.refresh_token;
        guard.expires_at = now + expires_in;
        debug!(expires_at = guard.expires_at, "Id token refreshed");

        Ok(guard.id_token.clone())
    }

    /// Force the next `id_token` call to refresh, e.g. after the database
    /// revoked the current token.
    pub async fn invalidate(&self) {
        self.token.lock().await.expires_at = 0;
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse> {
        let url = format!("{}/v1/token", self.token_url);
        self.http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .context("Firebase token refresh request failed")?
            .error_for_status()
            .context("Firebase token endpoint returned error status")?
            .json::<RefreshResponse>()
            .await
            .context("Failed to deserialize Firebase token refresh response")
    }
}

fn needs_refresh(expires_at: i64, now: i64) -> bool {
    expires_at <= now + REFRESH_MARGIN_SECS
}
