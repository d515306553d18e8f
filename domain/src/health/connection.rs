//! Connection health state machine.
//!
//! ```text
//!            1 success                  N consecutive failures
//! Unknown ─────────────▶ Healthy ──────────────────────────▶ Unhealthy
//!    │                      ▲                                    │
//!    │ N consecutive        └────────────────────────────────────┘
//!    │ failures                    M consecutive successes
//!    └──────────────────────────────────────────────────────────▶ Unhealthy
//! ```
//!
//! `N` and `M` come from [`HealthPolicy`] (defaults 3 and 2). The counters
//! reset each other, so a single blip never flips a healthy tool.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Liveness classification of a tool's live backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    #[default]
    Unknown,
    Healthy,
    Unhealthy,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Unknown => "unknown",
            HealthState::Healthy => "healthy",
            HealthState::Unhealthy => "unhealthy",
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Hysteresis thresholds for the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthPolicy {
    /// Consecutive failures before a tool is considered unhealthy
    pub failure_threshold: u32,
    /// Consecutive successes before an unhealthy tool is trusted again
    pub recovery_threshold: u32,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_threshold: 2,
        }
    }
}

/// A state change produced by recording an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthTransition {
    pub from: HealthState,
    pub to: HealthState,
}

/// Liveness of one tool's live backend.
///
/// Fields are private: the only way to change the state is to feed outcomes
/// through [`record_success`](Self::record_success) and
/// [`record_failure`](Self::record_failure).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionHealth {
    state: HealthState,
    consecutive_successes: u32,
    consecutive_failures: u32,
    last_checked_at: Option<DateTime<Utc>>,
}

impl ConnectionHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> HealthState {
        self.state
    }

    pub fn consecutive_successes(&self) -> u32 {
        self.consecutive_successes
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_checked_at(&self) -> Option<DateTime<Utc>> {
        self.last_checked_at
    }

    pub fn is_unhealthy(&self) -> bool {
        self.state == HealthState::Unhealthy
    }

    /// Record a successful probe or live call
    pub fn record_success(
        &mut self,
        policy: &HealthPolicy,
        at: DateTime<Utc>,
    ) -> Option<HealthTransition> {
        self.last_checked_at = Some(at);
        self.consecutive_failures = 0;
        self.consecutive_successes = self.consecutive_successes.saturating_add(1);

        let next = match self.state {
            HealthState::Unknown => HealthState::Healthy,
            HealthState::Healthy => HealthState::Healthy,
            HealthState::Unhealthy
                if self.consecutive_successes >= policy.recovery_threshold.max(1) =>
            {
                HealthState::Healthy
            }
            HealthState::Unhealthy => HealthState::Unhealthy,
        };
        self.transition_to(next)
    }

    /// Record a failed probe, connection failure or timeout
    pub fn record_failure(
        &mut self,
        policy: &HealthPolicy,
        at: DateTime<Utc>,
    ) -> Option<HealthTransition> {
        self.last_checked_at = Some(at);
        self.consecutive_successes = 0;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        let next = if self.consecutive_failures >= policy.failure_threshold.max(1) {
            HealthState::Unhealthy
        } else {
            self.state
        };
        self.transition_to(next)
    }

    fn transition_to(&mut self, next: HealthState) -> Option<HealthTransition> {
        if next == self.state {
            return None;
        }
        let transition = HealthTransition {
            from: self.state,
            to: next,
        };
        self.state = next;
        Some(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> HealthPolicy {
        HealthPolicy::default()
    }

    #[test]
    fn test_unknown_becomes_healthy_after_one_success() {
        let mut health = ConnectionHealth::new();
        let transition = health.record_success(&policy(), Utc::now());

        assert_eq!(health.state(), HealthState::Healthy);
        assert_eq!(
            transition,
            Some(HealthTransition {
                from: HealthState::Unknown,
                to: HealthState::Healthy
            })
        );
        assert!(health.last_checked_at().is_some());
    }

    #[test]
    fn test_healthy_survives_two_failures() {
        let mut health = ConnectionHealth::new();
        health.record_success(&policy(), Utc::now());
        assert!(health.record_failure(&policy(), Utc::now()).is_none());
        assert!(health.record_failure(&policy(), Utc::now()).is_none());
        assert_eq!(health.state(), HealthState::Healthy);
        assert_eq!(health.consecutive_failures(), 2);
    }

    #[test]
    fn test_blip_resets_failure_count() {
        let mut health = ConnectionHealth::new();
        health.record_success(&policy(), Utc::now());
        health.record_failure(&policy(), Utc::now());
        health.record_failure(&policy(), Utc::now());
        health.record_success(&policy(), Utc::now());
        health.record_failure(&policy(), Utc::now());
        health.record_failure(&policy(), Utc::now());
        assert_eq!(health.state(), HealthState::Healthy);
    }

    #[test]
    fn test_three_failures_then_recovery_needs_two_successes() {
        let mut health = ConnectionHealth::new();
        health.record_success(&policy(), Utc::now());
        for _ in 0..3 {
            health.record_failure(&policy(), Utc::now());
        }
        assert_eq!(health.state(), HealthState::Unhealthy);

        assert!(health.record_success(&policy(), Utc::now()).is_none());
        assert_eq!(health.state(), HealthState::Unhealthy);

        let transition = health.record_success(&policy(), Utc::now());
        assert_eq!(health.state(), HealthState::Healthy);
        assert_eq!(transition.map(|t| t.from), Some(HealthState::Unhealthy));
    }

    #[test]
    fn test_unknown_becomes_unhealthy_after_threshold() {
        let mut health = ConnectionHealth::new();
        health.record_failure(&policy(), Utc::now());
        health.record_failure(&policy(), Utc::now());
        assert_eq!(health.state(), HealthState::Unknown);
        health.record_failure(&policy(), Utc::now());
        assert_eq!(health.state(), HealthState::Unhealthy);
    }

    #[test]
    fn test_custom_policy() {
        let policy = HealthPolicy {
            failure_threshold: 1,
            recovery_threshold: 3,
        };
        let mut health = ConnectionHealth::new();
        health.record_failure(&policy, Utc::now());
        assert!(health.is_unhealthy());
        health.record_success(&policy, Utc::now());
        health.record_success(&policy, Utc::now());
        assert!(health.is_unhealthy());
        health.record_success(&policy, Utc::now());
        assert_eq!(health.state(), HealthState::Healthy);
    }
}
