pub mod engine;
pub mod ingestor;
pub mod observable;
pub mod position_source;
pub mod session_store;
pub mod speed_filter;

pub use engine::TrackingEngine;
pub use ingestor::IngestorConfig;
pub use position_source::{PositionSource, SettingsStatus};
