pub mod api;
pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod event_log;
pub mod firebase;
pub mod panel;
pub mod session;
pub mod snapshot_store;
pub mod telemetry;
pub mod transport;

#[cfg(test)]
mod mock;
