//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod alert_notifier;
pub mod config_source;
pub mod invocation_logger;
pub mod tool_backend;
