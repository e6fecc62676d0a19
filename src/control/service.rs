use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::{
    error::DashboardError,
    event_log::EventLog,
    snapshot_store::SnapshotStore,
    telemetry::models::Relay,
    transport::RealtimeTransport,
};

/// A single relay write, computed from the snapshot at toggle time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RelayCommand {
    pub relay: Relay,
    /// Database path written, e.g. `/SensorData/Relay1_Status`.
    pub path: String,
    /// `1` to switch on, `0` to switch off.
    pub value: u8,
}

/// Turns relay toggles into remote writes.
///
/// Writes are optimistic: the snapshot is never touched here, the echo
/// through the telemetry subscription updates it. Two toggles issued before
/// the first echo arrives both read the same state.
#[derive(Clone)]
pub struct RelayCommandIssuer {
    transport: Arc<dyn RealtimeTransport>,
    store: SnapshotStore,
    log: Option<EventLog>,
    root: String,
}

impl RelayCommandIssuer {
    pub fn new(
        transport: Arc<dyn RealtimeTransport>,
        store: SnapshotStore,
        log: Option<EventLog>,
        root: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            store,
            log,
            root: root.into(),
        }
    }

    /// Build the command a toggle of `relay` would issue right now.
    pub async fn command(&self, relay: Relay) -> RelayCommand {
        let current = self.store.snapshot().await.relay(relay);
        RelayCommand {
            relay,
            path: relay.status_path(&self.root),
            value: current.toggled_value(),
        }
    }

    /// Issue exactly one write of the opposite state of `relay`.
    pub async fn toggle(&self, relay: Relay) -> Result<RelayCommand, DashboardError> {
        let command = self.command(relay).await;
        self.send(command).await
    }

    /// Write a precomputed command and report its outcome.
    ///
    /// A rejected write is logged and returned; nothing is rolled back or
    /// retried.
    pub async fn send(&self, command: RelayCommand) -> Result<RelayCommand, DashboardError> {
        let relay = command.relay;
        match self.transport.write(&command.path, json!(command.value)).await {
            Ok(()) => {
                info!(relay = %relay, value = command.value, "{relay} toggled successfully.");
                self.record(format!("{relay} toggled successfully.")).await;
                Ok(command)
            }
            Err(e) => {
                let err = DashboardError::CommandWriteFailure {
                    relay,
                    reason: format!("{e:#}"),
                };
                error!(relay = %relay, error = %err, "Relay write failed");
                self.record(err.to_string()).await;
                Err(err)
            }
        }
    }

    async fn record(&self, message: String) {
        if let Some(log) = &self.log {
            log.append(message).await;
        }
    }
}
