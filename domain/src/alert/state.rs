//! Idempotent alert state.
//!
//! ```text
//!              condition true
//! Resolved ───────────────────▶ Firing   (first_fired_at set, notify once)
//!    ▲                            │
//!    └────────────────────────────┘
//!              condition false   (first_fired_at cleared, notify once)
//! ```
//!
//! Re-evaluating a firing alert whose condition still holds only refreshes
//! `last_evaluated_at`.

use super::rule::{AlertRuleId, Severity};
use crate::tool::ToolName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    #[default]
    Resolved,
    Firing,
}

/// Direction of a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertTransition {
    Fired,
    Resolved,
}

/// Named alert condition for one tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertState {
    pub rule_id: AlertRuleId,
    pub tool_name: ToolName,
    pub severity: Severity,
    status: AlertStatus,
    first_fired_at: Option<DateTime<Utc>>,
    last_evaluated_at: Option<DateTime<Utc>>,
}

impl AlertState {
    pub fn new(rule_id: AlertRuleId, tool_name: ToolName) -> Self {
        Self {
            rule_id,
            tool_name,
            severity: rule_id.severity(),
            status: AlertStatus::Resolved,
            first_fired_at: None,
            last_evaluated_at: None,
        }
    }

    pub fn status(&self) -> AlertStatus {
        self.status
    }

    pub fn is_firing(&self) -> bool {
        self.status == AlertStatus::Firing
    }

    pub fn first_fired_at(&self) -> Option<DateTime<Utc>> {
        self.first_fired_at
    }

    pub fn last_evaluated_at(&self) -> Option<DateTime<Utc>> {
        self.last_evaluated_at
    }

    /// Apply the latest condition value; returns a transition only on change
    pub fn evaluate(&mut self, condition: bool, now: DateTime<Utc>) -> Option<AlertTransition> {
        self.last_evaluated_at = Some(now);
        match (self.status, condition) {
            (AlertStatus::Resolved, true) => {
                self.status = AlertStatus::Firing;
                self.first_fired_at = Some(now);
                Some(AlertTransition::Fired)
            }
            (AlertStatus::Firing, false) => {
                self.status = AlertStatus::Resolved;
                self.first_fired_at = None;
                Some(AlertTransition::Resolved)
            }
            _ => None,
        }
    }
}

/// A recorded alert transition, kept in the alert history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub rule_id: AlertRuleId,
    pub tool_name: ToolName,
    pub severity: Severity,
    pub transition: AlertTransition,
    pub at: DateTime<Utc>,
    /// Human-readable summary of the statistics that caused the change
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_fires_once() {
        let mut state = AlertState::new(AlertRuleId::ToolUnavailable, "weather".into());
        let t0 = Utc::now();
        let t1 = t0 + Duration::seconds(1);

        assert_eq!(state.evaluate(true, t0), Some(AlertTransition::Fired));
        assert_eq!(state.evaluate(true, t1), None);

        assert!(state.is_firing());
        assert_eq!(state.first_fired_at(), Some(t0));
        assert_eq!(state.last_evaluated_at(), Some(t1));
    }

    #[test]
    fn test_resolve_clears_first_fired_at() {
        let mut state = AlertState::new(AlertRuleId::HighLatency, "chart".into());
        state.evaluate(true, Utc::now());
        assert_eq!(state.evaluate(false, Utc::now()), Some(AlertTransition::Resolved));
        assert_eq!(state.status(), AlertStatus::Resolved);
        assert!(state.first_fired_at().is_none());
    }

    #[test]
    fn test_resolved_stays_quiet() {
        let mut state = AlertState::new(AlertRuleId::FrequentErrors, "search".into());
        assert_eq!(state.evaluate(false, Utc::now()), None);
        assert!(state.last_evaluated_at().is_some());
        assert_eq!(state.severity, Severity::Warning);
    }

    #[test]
    fn test_refire_gets_new_timestamp() {
        let mut state = AlertState::new(AlertRuleId::LowSuccessRate, "search".into());
        let t0 = Utc::now();
        state.evaluate(true, t0);
        state.evaluate(false, t0 + Duration::seconds(1));
        let t2 = t0 + Duration::seconds(2);
        assert_eq!(state.evaluate(true, t2), Some(AlertTransition::Fired));
        assert_eq!(state.first_fired_at(), Some(t2));
    }
}
