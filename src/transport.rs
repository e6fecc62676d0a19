//! Seam between the dashboard core and the realtime database.
//!
//! The core only sees [`RealtimeTransport`]; `firebase::FirebaseDatabase`
//! implements it against the Firebase REST streaming API and the tests use
//! `mock::MockTransport`.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::session::AuthenticatedUser;

/// One notification delivered by a subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeUpdate {
    /// Current value of the whole subscribed node; `None` when it is absent.
    Value(Option<Value>),
    /// Transport-level read failure. The subscription stays open.
    Error(String),
}

#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// Start listening on `path`. Updates arrive in delivery order until the
    /// returned handle is released or dropped.
    fn subscribe(&self, path: &str) -> Subscription;

    /// Set the value at `path`. Resolves once the server acknowledged it.
    async fn write(&self, path: &str, value: Value) -> Result<()>;
}

/// Builds a transport authorised as the given user.
pub type TransportFactory =
    Arc<dyn Fn(&AuthenticatedUser) -> Arc<dyn RealtimeTransport> + Send + Sync>;

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

type ReleaseFn = Box<dyn FnOnce() + Send>;

/// Owned handle of a live subscription.
///
/// The release callback runs exactly once: on [`Subscription::release`] or,
/// failing that, on drop.
pub struct Subscription {
    updates: mpsc::UnboundedReceiver<NodeUpdate>,
    release: Option<ReleaseFn>,
}

impl Subscription {
    pub fn new<F>(updates: mpsc::UnboundedReceiver<NodeUpdate>, release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            updates,
            release: Some(Box::new(release)),
        }
    }

    /// Next update, or `None` once the transport side has gone away.
    pub async fn next(&mut self) -> Option<NodeUpdate> {
        self.updates.recv().await
    }

    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_once();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("released", &self.release.is_none())
            .finish()
    }
}
