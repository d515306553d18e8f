//! Application-level configuration.
//!
//! - [`OrchestratorConfig`]: health, probing, metrics window and alerting knobs

pub mod orchestrator_config;

pub use orchestrator_config::{DEFAULT_ALERT_HISTORY, DEFAULT_PROBE_INTERVAL, OrchestratorConfig};
