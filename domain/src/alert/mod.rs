//! Alerting domain
//!
//! - [`rule::AlertRuleId`]: built-in rules and their conditions
//! - [`state::AlertState`]: idempotent firing/resolved state per (rule, tool)

pub mod rule;
pub mod state;

pub use rule::{AlertRuleId, AlertThresholds, Severity};
pub use state::{AlertEvent, AlertState, AlertStatus, AlertTransition};
