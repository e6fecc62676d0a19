use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use crate::{
    control::RelayCommandIssuer,
    event_log::EventLog,
    snapshot_store::SnapshotStore,
    telemetry::TelemetrySynchronizer,
    transport::RealtimeTransport,
};

/// Cloned handles onto a mounted panel, for readers outside the panel owner.
#[derive(Clone)]
pub struct PanelHandles {
    pub store: SnapshotStore,
    pub log: Option<EventLog>,
    pub issuer: RelayCommandIssuer,
}

#[derive(Debug, Clone)]
pub struct PanelOptions {
    /// Remote node to subscribe to; relay paths live below it.
    pub sensor_path: String,
    /// Keep an event log for this mount.
    pub event_log: bool,
}

/// One mounted telemetry panel: a live subscription feeding a snapshot
/// store, the relay issuer reading it, and the optional event log.
///
/// The subscription is owned by the synchronizer task. Aborting the task
/// drops it, which releases it; this happens on `unmount` and on drop.
pub struct TelemetryPanel {
    store: SnapshotStore,
    log: Option<EventLog>,
    issuer: RelayCommandIssuer,
    task: Option<JoinHandle<()>>,
}

impl TelemetryPanel {
    pub async fn mount(transport: Arc<dyn RealtimeTransport>, options: &PanelOptions) -> Self {
        let store = SnapshotStore::new();
        let log = options.event_log.then(EventLog::new);

        let subscription = transport.subscribe(&options.sensor_path);
        store.mark_subscribed().await;
        info!(
            path = %options.sensor_path,
            event_log = options.event_log,
            "Telemetry panel mounted"
        );

        let synchronizer = TelemetrySynchronizer::new(store.clone(), log.clone());
        let task = tokio::spawn(synchronizer.run(subscription));

        let issuer = RelayCommandIssuer::new(
            transport,
            store.clone(),
            log.clone(),
            options.sensor_path.clone(),
        );

        Self {
            store,
            log,
            issuer,
            task: Some(task),
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn log(&self) -> Option<&EventLog> {
        self.log.as_ref()
    }

    pub fn issuer(&self) -> &RelayCommandIssuer {
        &self.issuer
    }

    pub fn handles(&self) -> PanelHandles {
        PanelHandles {
            store: self.store.clone(),
            log: self.log.clone(),
            issuer: self.issuer.clone(),
        }
    }

    /// Stop the synchronizer and wait until its subscription is released.
    pub async fn unmount(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // Resolves once the task's future, and with it the subscription,
            // has been dropped.
            let _ = task.await;
        }
        self.store.mark_unsubscribed().await;
        info!("Telemetry panel unmounted");
    }
}

impl Drop for TelemetryPanel {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
