//! Orchestrator parameters.
//!
//! [`OrchestratorConfig`] groups the runtime knobs shared by the dispatcher,
//! the health tracker, the prober and the alert manager. File and
//! environment loading lives in the infrastructure layer, which converts its
//! `FileConfig` into this type.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use toolgate_domain::metrics::DEFAULT_WINDOW_CAPACITY;
use toolgate_domain::{AlertThresholds, HealthPolicy};

/// Default interval between background health probes
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(30);

/// Default number of alert transitions kept in memory
pub const DEFAULT_ALERT_HISTORY: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Hysteresis thresholds for connection health
    pub health: HealthPolicy,
    /// How often the prober pings live backends of live/auto tools
    #[serde(
        with = "toolgate_domain::util::duration_ms",
        rename = "probe_interval_ms"
    )]
    pub probe_interval: Duration,
    /// Disable to rely on call results only
    pub probe_enabled: bool,
    /// Invocations kept per tool in the metrics window
    pub window_capacity: usize,
    pub alert_thresholds: AlertThresholds,
    /// Most recent alert transitions kept for status reporting
    pub alert_history: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            health: HealthPolicy::default(),
            probe_interval: DEFAULT_PROBE_INTERVAL,
            probe_enabled: true,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            alert_thresholds: AlertThresholds::default(),
            alert_history: DEFAULT_ALERT_HISTORY,
        }
    }
}

impl OrchestratorConfig {
    // ==================== Builder Methods ====================

    pub fn with_health_policy(mut self, policy: HealthPolicy) -> Self {
        self.health = policy;
        self
    }

    pub fn with_probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval;
        self
    }

    pub fn without_probing(mut self) -> Self {
        self.probe_enabled = false;
        self
    }

    pub fn with_window_capacity(mut self, capacity: usize) -> Self {
        self.window_capacity = capacity;
        self
    }

    pub fn with_alert_thresholds(mut self, thresholds: AlertThresholds) -> Self {
        self.alert_thresholds = thresholds;
        self
    }

    pub fn with_alert_history(mut self, limit: usize) -> Self {
        self.alert_history = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.health.failure_threshold, 3);
        assert_eq!(config.health.recovery_threshold, 2);
        assert_eq!(config.probe_interval, Duration::from_secs(30));
        assert_eq!(config.window_capacity, 200);
        assert_eq!(config.alert_history, 500);
        assert!(config.probe_enabled);
    }

    #[test]
    fn test_builder_chain() {
        let config = OrchestratorConfig::default()
            .with_probe_interval(Duration::from_secs(5))
            .with_window_capacity(50)
            .without_probing();
        assert_eq!(config.probe_interval, Duration::from_secs(5));
        assert_eq!(config.window_capacity, 50);
        assert!(!config.probe_enabled);
    }
}
