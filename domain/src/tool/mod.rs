//! Tool domain module
//!
//! Defines what a tool *is* to the orchestration layer: a named capability
//! ([`ToolDescriptor`]) with a routing policy ([`ToolMode`]), and the record of
//! one call of it ([`Invocation`]).
//!
//! ```text
//! ┌────────────────┐    ┌────────────────┐    ┌────────────────┐
//! │ ToolDescriptor │───▶│   Dispatcher   │───▶│   Invocation   │
//! │ (registry)     │    │ (live/degraded)│    │ (one outcome)  │
//! └────────────────┘    └────────────────┘    └────────────────┘
//! ```
//!
//! # Modes
//!
//! | Mode | Live backend | Degraded substitute |
//! |------|--------------|---------------------|
//! | `live` | always | never |
//! | `degraded` | never | always |
//! | `auto` | unless unhealthy | when unhealthy or after live failure |
//!
//! The concrete backends live behind the application layer's `ToolBackend`
//! port; nothing in this module performs I/O.

pub mod entities;
pub mod mode;
pub mod value_objects;

pub use entities::{DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT, ToolDescriptor, ToolName};
pub use mode::{ToolMode, UsedMode};
pub use value_objects::{
    DegradedModeNotice, DegradedReason, Invocation, InvocationId, InvocationOutcome,
    InvocationValue,
};
