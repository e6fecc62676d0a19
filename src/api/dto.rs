use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    event_log::LogEntry,
    snapshot_store::SyncState,
    telemetry::models::SensorSnapshot,
};

/// Rendered strings exactly as the dashboard shows them.
#[derive(Debug, Serialize, ToSchema)]
pub struct SensorDisplayDto {
    /// e.g. `"22.5°C"` or `"N/A"`.
    pub temperature: String,
    /// e.g. `"55%"` or `"N/A"`.
    pub humidity: String,
    pub gas_level: String,
    /// `"Motion Detected"` or `"No Motion"`.
    pub pir: String,
    /// `"ON"` or `"OFF"`.
    pub relay1: String,
    pub relay2: String,
    pub relay3: String,
}

impl From<&SensorSnapshot> for SensorDisplayDto {
    fn from(s: &SensorSnapshot) -> Self {
        Self {
            temperature: s.temperature_display(),
            humidity: s.humidity_display(),
            gas_level: s.gas_level_display(),
            pir: s.pir.to_string(),
            relay1: s.relay1.to_string(),
            relay2: s.relay2.to_string(),
            relay3: s.relay3.to_string(),
        }
    }
}

/// Response for `GET /api/sensors`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SensorStatusDto {
    pub sync: SyncState,
    /// Snapshot keyed like the remote node: numeric readings are numbers or
    /// `"N/A"`, PIR and relays are their display strings.
    #[schema(value_type = Object)]
    pub snapshot: SensorSnapshot,
    pub display: SensorDisplayDto,
}

impl SensorStatusDto {
    pub fn new(sync: SyncState, snapshot: SensorSnapshot) -> Self {
        let display = SensorDisplayDto::from(&snapshot);
        Self {
            sync,
            snapshot,
            display,
        }
    }
}

/// Response for `GET /api/log`.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventLogDto {
    /// `false` when the service runs without the event log.
    pub enabled: bool,
    /// Number of entries in the log, for the next `since`.
    pub total: usize,
    pub entries: Vec<LogEntry>,
}

#[derive(Debug, Deserialize)]
pub struct LogParams {
    /// Skip the first `since` entries.
    pub since: Option<usize>,
}

/// Body of `POST /login`.
#[derive(Deserialize, ToSchema)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}
