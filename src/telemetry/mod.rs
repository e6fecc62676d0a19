pub mod models;
pub mod synchronizer;

pub use synchronizer::TelemetrySynchronizer;
