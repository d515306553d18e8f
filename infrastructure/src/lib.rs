//! Infrastructure layer for toolgate
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: configuration loading, tool backends, invocation
//! logging and workflow definition files.

pub mod config;
pub mod logging;
pub mod tools;
pub mod workflow;

// Re-export commonly used types
pub use config::{
    ConfigError, ConfigIssue, ConfigLoader, EnvConfigSource, FileConfig, FileToolConfig,
    IssueSeverity,
};
pub use logging::{JsonlInvocationLogger, TracingAlertNotifier};
pub use tools::{
    BackendBuildError, BackendFactory, CannedToolBackend, CommandToolBackend, RegistrationReport,
};
#[cfg(feature = "web-tools")]
pub use tools::HttpToolBackend;
pub use workflow::{WorkflowFileError, WorkflowLoader};
