use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::DashboardError,
    panel::{PanelHandles, PanelOptions, TelemetryPanel},
    session::{IdentityProvider, SessionGate},
    transport::TransportFactory,
};

/// What the dashboard page shows to one viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Login { error: Option<&'static str> },
    Panel { email: String },
}

/// The signed-in viewer's panel, bound to the opaque id handed out at login.
struct Active {
    session: String,
    panel: TelemetryPanel,
}

/// Top-level application state: the session gate and, while a user is
/// signed in, the mounted telemetry panel.
///
/// Only the viewer holding the current session id sees the panel. A new
/// sign-in replaces the previous session.
pub struct Dashboard {
    gate: SessionGate,
    connect: TransportFactory,
    options: PanelOptions,
    active: Mutex<Option<Active>>,
}

impl Dashboard {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        connect: TransportFactory,
        options: PanelOptions,
    ) -> Self {
        Self {
            gate: SessionGate::new(identity),
            connect,
            options,
            active: Mutex::new(None),
        }
    }

    /// Sign in and mount a panel for the new user. Returns the session id
    /// that later calls must present. A panel left over from an earlier
    /// session is unmounted first.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, DashboardError> {
        // Held across the sign-in so a concurrent logout sees either the old
        // session or the new one, never a user without a panel.
        let mut slot = self.active.lock().await;
        let user = self.gate.submit(email, password).await?;

        if let Some(previous) = slot.take() {
            previous.panel.unmount().await;
        }
        let transport = (self.connect)(&user);
        let panel = TelemetryPanel::mount(transport, &self.options).await;
        let session = Uuid::new_v4().simple().to_string();
        *slot = Some(Active {
            session: session.clone(),
            panel,
        });
        Ok(session)
    }

    /// Unmount the panel and forget the user, if `session` is the current
    /// one. Returns whether anything was signed out.
    pub async fn logout(&self, session: &str) -> bool {
        let mut slot = self.active.lock().await;
        let Some(active) = slot.take_if(|a| a.session == session) else {
            return false;
        };
        active.panel.unmount().await;
        self.gate.sign_out().await;
        true
    }

    /// Release the subscription before the process exits.
    pub async fn shutdown(&self) {
        if let Some(active) = self.active.lock().await.take() {
            active.panel.unmount().await;
        }
        info!("Dashboard shut down");
    }

    /// Page for the viewer presenting `session`. Anyone without the current
    /// session id gets the login form.
    pub async fn view(&self, session: Option<&str>) -> View {
        let slot = self.active.lock().await;
        let signed_in = matches!((slot.as_ref(), session), (Some(a), Some(s)) if a.session == s);
        match self.gate.user().await {
            Some(user) if signed_in => View::Panel { email: user.email },
            _ => View::Login {
                error: self.gate.error().await,
            },
        }
    }

    /// Handles onto the mounted panel, if `session` is the current one.
    pub async fn panel(&self, session: &str) -> Option<PanelHandles> {
        self.active
            .lock()
            .await
            .as_ref()
            .filter(|a| a.session == session)
            .map(|a| a.panel.handles())
    }

    pub fn event_log_enabled(&self) -> bool {
        self.options.event_log
    }
}
