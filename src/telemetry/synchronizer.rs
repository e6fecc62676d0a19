use tracing::{debug, error, info};

use crate::{
    error::DashboardError,
    event_log::EventLog,
    snapshot_store::SnapshotStore,
    telemetry::models::SensorSnapshot,
    transport::{NodeUpdate, Subscription},
};

/// What a single update did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The snapshot was replaced; carries the update count since mount.
    Replaced(u64),
    /// Empty payload; the last known snapshot was kept.
    Held,
}

/// Projects remote node updates into a `SnapshotStore` and, when enabled,
/// the panel's event log.
#[derive(Clone)]
pub struct TelemetrySynchronizer {
    store: SnapshotStore,
    log: Option<EventLog>,
}

impl TelemetrySynchronizer {
    pub fn new(store: SnapshotStore, log: Option<EventLog>) -> Self {
        Self { store, log }
    }

    /// Drain `subscription` until the transport closes it.
    /// Spawn this via `tokio::spawn`; aborting the task releases the
    /// subscription.
    pub async fn run(self, mut subscription: Subscription) {
        debug!("Telemetry synchronizer started");
        while let Some(update) = subscription.next().await {
            // Failures are already reported by `apply`.
            let _ = self.apply(update).await;
        }
        info!("Telemetry subscription closed by transport");
        subscription.release();
    }

    /// Apply one update.
    ///
    /// A read error is reported to the diagnostic channels and returned; the
    /// snapshot is left untouched and nothing is retried here.
    pub async fn apply(&self, update: NodeUpdate) -> Result<Applied, DashboardError> {
        match update {
            NodeUpdate::Value(node) => {
                let Some(snapshot) = node.as_ref().and_then(SensorSnapshot::from_node) else {
                    debug!("Empty sensor payload; keeping last snapshot");
                    return Ok(Applied::Held);
                };

                let summary = snapshot.summary();
                let updates = self.store.replace(snapshot).await;
                debug!(updates, snapshot = %summary, "Sensor snapshot replaced");

                if let Some(log) = &self.log {
                    log.append(format!("Sensor data updated: {summary}")).await;
                }
                Ok(Applied::Replaced(updates))
            }

            NodeUpdate::Error(reason) => {
                let err = DashboardError::SubscriptionReadFailure(reason);
                error!(error = %err, "Telemetry subscription read failed");
                if let Some(log) = &self.log {
                    log.append(err.to_string()).await;
                }
                Err(err)
            }
        }
    }
}
