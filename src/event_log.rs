use std::{fmt, sync::Arc};

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use tokio::sync::RwLock;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LogEntry {
    /// Local wall-clock time, e.g. `3/14/2026, 9:26:53 AM`.
    pub timestamp: String,
    pub message: String,
}

/// Append-only, in-memory event log of one mounted panel.
///
/// Grows without bound for the lifetime of the mount; a remount starts a
/// fresh log. Clones share the same entries.
#[derive(Clone, Default)]
pub struct EventLog {
    inner: Arc<RwLock<Vec<LogEntry>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, message: impl Into<String>) {
        let entry = LogEntry {
            timestamp: format_timestamp(&Local::now()),
            message: message.into(),
        };
        self.inner.write().await.push(entry);
    }

    /// All entries, oldest first.
    pub async fn entries(&self) -> Vec<LogEntry> {
        self.inner.read().await.clone()
    }

    /// Total entry count and the entries appended after the first `offset`
    /// ones, read under one lock so the count matches the tail.
    pub async fn entries_since(&self, offset: usize) -> (usize, Vec<LogEntry>) {
        let entries = self.inner.read().await;
        let tail = entries.iter().skip(offset).cloned().collect();
        (entries.len(), tail)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

/// `M/D/YYYY, h:mm:ss AM` in the timezone of `t`.
pub fn format_timestamp<Tz>(t: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    t.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}
