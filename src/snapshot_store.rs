use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::telemetry::models::SensorSnapshot;

/// Lifecycle of the telemetry subscription behind a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncState {
    #[default]
    Unsubscribed,
    AwaitingFirstSnapshot,
    /// `updates` counts the snapshots received since mount.
    Live { updates: u64 },
}

#[derive(Default)]
struct Inner {
    snapshot: SensorSnapshot,
    state: SyncState,
}

/// Latest `SensorSnapshot` of one mounted panel plus its sync state.
///
/// Wrapped in `Arc` so the synchronizer task, the relay issuer and the HTTP
/// handlers share one copy. Only the synchronizer writes it.
#[derive(Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<RwLock<Inner>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> SensorSnapshot {
        self.inner.read().await.snapshot.clone()
    }

    pub async fn state(&self) -> SyncState {
        self.inner.read().await.state
    }

    /// Snapshot and state read under one lock.
    pub async fn view(&self) -> (SyncState, SensorSnapshot) {
        let inner = self.inner.read().await;
        (inner.state, inner.snapshot.clone())
    }

    pub async fn mark_subscribed(&self) {
        self.inner.write().await.state = SyncState::AwaitingFirstSnapshot;
    }

    pub async fn mark_unsubscribed(&self) {
        self.inner.write().await.state = SyncState::Unsubscribed;
    }

    /// Replace the snapshot wholesale and advance the update count.
    /// Returns the new count.
    pub async fn replace(&self, snapshot: SensorSnapshot) -> u64 {
        let mut inner = self.inner.write().await;
        let updates = match inner.state {
            SyncState::Live { updates } => updates + 1,
            _ => 1,
        };
        inner.snapshot = snapshot;
        inner.state = SyncState::Live { updates };
        updates
    }
}
