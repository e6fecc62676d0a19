use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{DashboardError, INVALID_CREDENTIALS};

// ---------------------------------------------------------------------------
// AuthenticatedUser
// ---------------------------------------------------------------------------

/// Identity handle returned by a successful sign-in.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub uid: String,
    pub email: String,
    pub id_token: String,
    pub refresh_token: String,
    /// Unix timestamp (seconds) when `id_token` expires.
    pub expires_at: i64,
}

impl std::fmt::Debug for AuthenticatedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedUser")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Sign in with email and password. Any error means "rejected"; callers
    /// do not inspect it.
    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthenticatedUser>;
}

// ---------------------------------------------------------------------------
// SessionGate
// ---------------------------------------------------------------------------

#[derive(Default)]
struct GateState {
    user: Option<AuthenticatedUser>,
    error: Option<&'static str>,
}

/// Holds whether a user is signed in and the last sign-in error.
pub struct SessionGate {
    identity: Arc<dyn IdentityProvider>,
    state: RwLock<GateState>,
}

impl SessionGate {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            identity,
            state: RwLock::new(GateState::default()),
        }
    }

    /// Try to sign in. On success the user is stored and returned; on any
    /// rejection the generic error message is set and the gate stays closed.
    pub async fn submit(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, DashboardError> {
        match self.identity.authenticate(email, password).await {
            Ok(user) => {
                info!(uid = %user.uid, "User signed in");
                let mut state = self.state.write().await;
                state.user = Some(user.clone());
                state.error = None;
                Ok(user)
            }
            Err(_) => {
                info!("Sign-in rejected");
                self.state.write().await.error = Some(INVALID_CREDENTIALS);
                Err(DashboardError::AuthenticationFailure)
            }
        }
    }

    pub async fn user(&self) -> Option<AuthenticatedUser> {
        self.state.read().await.user.clone()
    }

    /// Message to show on the login form, if the last attempt failed.
    pub async fn error(&self) -> Option<&'static str> {
        self.state.read().await.error
    }

    pub async fn sign_out(&self) {
        let mut state = self.state.write().await;
        if let Some(user) = state.user.take() {
            info!(uid = %user.uid, "User signed out");
        }
        state.error = None;
    }
}
