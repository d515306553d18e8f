//! Domain layer for toolgate
//!
//! This crate contains the core types and state machines of the tool
//! orchestration layer. It has no dependencies on runtime, I/O or
//! configuration-file concerns.
//!
//! # Core Concepts
//!
//! ## Tools and modes
//!
//! Every tool is a named capability ([`ToolDescriptor`]) with a routing
//! policy ([`ToolMode`]): `live`, `degraded` or `auto`. One call produces one
//! [`Invocation`] with exactly one [`InvocationOutcome`].
//!
//! ## Health
//!
//! [`ConnectionHealth`] classifies a live backend as unknown, healthy or
//! unhealthy with hysteresis, so one blip never flips a tool.
//!
//! ## Metrics and alerts
//!
//! [`MetricsWindow`] keeps rolling per-tool statistics; [`AlertState`] turns
//! rule conditions into idempotent firing/resolved transitions.
//!
//! ## Workflows
//!
//! [`WorkflowDefinition`] declares steps and parallel groups under one
//! deadline; [`WorkflowRun`] records results and degraded steps.

pub mod alert;
pub mod core;
pub mod health;
pub mod metrics;
pub mod tool;
pub mod util;
pub mod workflow;

// Re-export commonly used types
pub use alert::{
    AlertEvent, AlertRuleId, AlertState, AlertStatus, AlertThresholds, AlertTransition, Severity,
};
pub use core::error::ToolError;
pub use health::{ConnectionHealth, HealthPolicy, HealthState, HealthTransition};
pub use metrics::{MetricsWindow, WindowStats};
pub use tool::{
    DegradedModeNotice, DegradedReason, Invocation, InvocationId, InvocationOutcome,
    InvocationValue, ToolDescriptor, ToolMode, ToolName, UsedMode,
};
pub use workflow::{
    DegradedStep, InputBinding, InputMapping, RunId, StepDegradation, StepId, StepOutput,
    WorkflowDefinition, WorkflowRun, WorkflowStep, WorkflowValidationError,
};
