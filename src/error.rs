use thiserror::Error;

use crate::telemetry::models::Relay;

/// Message shown on the login form for every rejected sign-in.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials. Try again.";

/// Every failure the dashboard reports. None of them is fatal: each is
/// caught where it happens, reported, and the view keeps running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    /// Any credential rejection. The provider's reason is not kept.
    #[error("Invalid credentials. Try again.")]
    AuthenticationFailure,

    /// The realtime stream reported a read error. Diagnostic only.
    #[error("Error reading from Firebase: {0}")]
    SubscriptionReadFailure(String),

    /// A relay write was rejected. The snapshot is left as is.
    #[error("Error toggling {relay}: {reason}")]
    CommandWriteFailure { relay: Relay, reason: String },
}
