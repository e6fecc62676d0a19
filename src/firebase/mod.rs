pub mod auth;
pub mod database;
pub mod models;
pub mod stream;

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::{
    config::{Config, FirebaseConfig},
    session::{AuthenticatedUser, IdentityProvider},
    transport::{RealtimeTransport, TransportFactory},
};

use self::{
    auth::TokenSource,
    database::FirebaseDatabase,
    models::{parse_expires_in, SignInRequest, SignInResponse},
};

/// Entry point to the Firebase project: signs users in and hands out
/// database transports authorised as them.
#[derive(Clone)]
pub struct FirebaseClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    firebase: FirebaseConfig,
    stream_retry: Duration,
}

impl FirebaseClient {
    pub fn new(config: &Config) -> Self {
        Self {
            inner: Arc::new(Inner {
                http: Client::new(),
                firebase: config.firebase.clone(),
                stream_retry: Duration::from_secs(config.stream_retry_secs),
            }),
        }
    }

    /// Realtime Database client using `user`'s id token.
    pub fn database(&self, user: &AuthenticatedUser) -> FirebaseDatabase {
        let tokens = TokenSource::new(
            self.inner.http.clone(),
            &self.inner.firebase.token_url,
            &self.inner.firebase.api_key,
            user,
        );
        FirebaseDatabase::new(
            self.inner.http.clone(),
            &self.inner.firebase.database_url,
            tokens,
            self.inner.stream_retry,
        )
    }

    pub fn transport_factory(&self) -> TransportFactory {
        let client = self.clone();
        Arc::new(move |user: &AuthenticatedUser| {
            Arc::new(client.database(user)) as Arc<dyn RealtimeTransport>
        })
    }
}

#[async_trait]
impl IdentityProvider for FirebaseClient {
    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthenticatedUser> {
        let url = format!("{}/v1/accounts:signInWithPassword", self.inner.firebase.auth_url);
        debug!(url = %url, "Signing in with email and password");

        let body = SignInRequest {
            email,
            password,
            return_secure_token: true,
        };

        let resp = self
            .inner
            .http
            .post(&url)
            .query(&[("key", self.inner.firebase.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .context("Firebase sign-in request failed")?
            .error_for_status()
            .context("Firebase sign-in rejected")?
            .json::<SignInResponse>()
            .await
            .context("Failed to deserialize Firebase sign-in response")?;

        let expires_in = parse_expires_in(&resp.expires_in)?;
        Ok(AuthenticatedUser {
            uid: resp.local_id,
            email: resp.email,
            id_token: resp.id_token,
            refresh_token: resp.refresh_token,
            expires_at: chrono::Utc::now().timestamp() + expires_in,
        })
    }
}
