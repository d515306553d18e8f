//! Connection health tracking
//!
//! Holds one [`ConnectionHealth`] per tool behind its own mutex, so health
//! updates for different tools never contend. Both the dispatcher (live call
//! results) and the prober (ping results) feed the same state machine.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use toolgate_domain::{ConnectionHealth, HealthPolicy, HealthState, HealthTransition, ToolName};
use tracing::{debug, info, warn};

type Entry = Arc<Mutex<ConnectionHealth>>;

pub struct HealthTracker {
    policy: HealthPolicy,
    entries: RwLock<HashMap<ToolName, Entry>>,
}

impl HealthTracker {
    pub fn new(policy: HealthPolicy) -> Self {
        Self {
            policy,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &HealthPolicy {
        &self.policy
    }

    pub fn record_success(&self, tool: &ToolName) -> Option<HealthTransition> {
        let transition = self
            .entry(tool)
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record_success(&self.policy, Utc::now());
        log_transition(tool, transition);
        transition
    }

    pub fn record_failure(&self, tool: &ToolName) -> Option<HealthTransition> {
        let transition = self
            .entry(tool)
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record_failure(&self.policy, Utc::now());
        log_transition(tool, transition);
        transition
    }

    /// Current state; tools never observed are `Unknown`
    pub fn state(&self, tool: &ToolName) -> HealthState {
        self.snapshot(tool).state()
    }

    pub fn is_unhealthy(&self, tool: &ToolName) -> bool {
        self.state(tool) == HealthState::Unhealthy
    }

    /// Copy of the tool's health record
    pub fn snapshot(&self, tool: &ToolName) -> ConnectionHealth {
        let entry = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tool)
            .cloned();
        match entry {
            Some(entry) => entry.lock().unwrap_or_else(PoisonError::into_inner).clone(),
            None => ConnectionHealth::new(),
        }
    }

    fn entry(&self, tool: &ToolName) -> Entry {
        if let Some(entry) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tool)
        {
            return Arc::clone(entry);
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.entry(tool.clone()).or_default())
    }
}

fn log_transition(tool: &ToolName, transition: Option<HealthTransition>) {
    let Some(transition) = transition else {
        return;
    };
    match transition.to {
        HealthState::Unhealthy => {
            warn!(tool = %tool, from = %transition.from, "Tool became unhealthy")
        }
        HealthState::Healthy if transition.from == HealthState::Unhealthy => {
            info!(tool = %tool, "Tool recovered")
        }
        _ => debug!(tool = %tool, from = %transition.from, to = %transition.to, "Health changed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unobserved_tool_is_unknown() {
        let tracker = HealthTracker::new(HealthPolicy::default());
        assert_eq!(tracker.state(&"search".into()), HealthState::Unknown);
        assert!(tracker.snapshot(&"search".into()).last_checked_at().is_none());
    }

    #[test]
    fn test_hysteresis_through_tracker() {
        let tracker = HealthTracker::new(HealthPolicy::default());
        let tool = ToolName::from("search");

        tracker.record_failure(&tool);
        tracker.record_failure(&tool);
        assert_eq!(tracker.state(&tool), HealthState::Unknown);
        let transition = tracker.record_failure(&tool).unwrap();
        assert_eq!(transition.to, HealthState::Unhealthy);

        assert!(tracker.record_success(&tool).is_none());
        assert!(tracker.is_unhealthy(&tool));
        let transition = tracker.record_success(&tool).unwrap();
        assert_eq!(transition.from, HealthState::Unhealthy);
        assert_eq!(tracker.state(&tool), HealthState::Healthy);
    }

    #[test]
    fn test_tools_are_independent() {
        let tracker = HealthTracker::new(HealthPolicy {
            failure_threshold: 1,
            recovery_threshold: 1,
        });
        tracker.record_failure(&"search".into());
        tracker.record_success(&"weather".into());
        assert!(tracker.is_unhealthy(&"search".into()));
        assert_eq!(tracker.state(&"weather".into()), HealthState::Healthy);
    }
}
