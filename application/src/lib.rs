//! Application layer for toolgate
//!
//! This crate contains use cases, port definitions, runtime services and
//! application configuration. It depends only on the domain layer.

pub mod config;
pub mod orchestrator;
pub mod ports;
pub mod services;
pub mod use_cases;

// Re-export commonly used types
pub use config::OrchestratorConfig;
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use ports::{
    alert_notifier::{AlertNotifier, NoAlertNotifier},
    config_source::{ConfigSource, EmptyConfigSource},
    invocation_logger::{InvocationLogger, NoInvocationLogger},
    tool_backend::{BackendError, ToolBackend, ToolImplementations},
};
pub use services::{
    alert_manager::AlertManager, health_tracker::HealthTracker, metrics_store::MetricsStore,
    prober::{HealthProber, ProbeReport}, registry::{RegisteredTool, ToolRegistry},
};
pub use use_cases::dispatch::Dispatcher;
pub use use_cases::run_workflow::{WorkflowEngine, WorkflowError};
pub use use_cases::status_snapshot::{StatusSnapshot, ToolStatus};
