//! Runtime configuration from TOML (`[orchestrator]`, `[health]`, `[alerts]`)
//!
//! ```toml
//! [orchestrator]
//! tool_mode = "auto"              # default for tools without their own `mode`
//! probe_interval_ms = 30000
//! window_capacity = 200
//! invocation_log = "logs/invocations.jsonl"
//!
//! [health]
//! failure_threshold = 3
//! recovery_threshold = 2
//!
//! [alerts]
//! high_latency_ms = 5000
//! low_success_rate = 0.8
//! ```

use super::{ConfigIssue, IssueSeverity};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use toolgate_application::config::{DEFAULT_ALERT_HISTORY, DEFAULT_PROBE_INTERVAL};
use toolgate_domain::metrics::DEFAULT_WINDOW_CAPACITY;
use toolgate_domain::{AlertThresholds, HealthPolicy, ToolMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestratorConfig {
    /// Default routing mode: "live", "degraded" or "auto"
    pub tool_mode: String,
    pub probe_interval_ms: u64,
    pub probe_enabled: bool,
    pub window_capacity: usize,
    pub alert_history: usize,
    /// JSONL file receiving every completed invocation
    pub invocation_log: Option<String>,
}

impl Default for FileOrchestratorConfig {
    fn default() -> Self {
        Self {
            tool_mode: ToolMode::default().as_str().to_string(),
            probe_interval_ms: DEFAULT_PROBE_INTERVAL.as_millis() as u64,
            probe_enabled: true,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            alert_history: DEFAULT_ALERT_HISTORY,
            invocation_log: None,
        }
    }
}

impl FileOrchestratorConfig {
    /// Parse `tool_mode`, falling back to `auto` with an issue on failure.
    pub fn parse_tool_mode(&self) -> (ToolMode, Vec<ConfigIssue>) {
        match self.tool_mode.parse::<ToolMode>() {
            Ok(mode) => (mode, vec![]),
            Err(e) => (
                ToolMode::default(),
                vec![ConfigIssue::new(
                    IssueSeverity::Error,
                    "orchestrator.tool_mode",
                    format!("{} (expected live, degraded or auto)", e),
                )],
            ),
        }
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    pub(super) fn issues(&self) -> Vec<ConfigIssue> {
        let mut issues = self.parse_tool_mode().1;
        if self.probe_enabled && self.probe_interval_ms == 0 {
            issues.push(ConfigIssue::new(
                IssueSeverity::Error,
                "orchestrator.probe_interval_ms",
                "must be greater than 0 while probing is enabled",
            ));
        }
        if self.window_capacity == 0 {
            issues.push(ConfigIssue::new(
                IssueSeverity::Error,
                "orchestrator.window_capacity",
                "must be at least 1",
            ));
        }
        if self.alert_history == 0 {
            issues.push(ConfigIssue::new(
                IssueSeverity::Warning,
                "orchestrator.alert_history",
                "0 is raised to 1",
            ));
        }
        issues
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHealthConfig {
    pub failure_threshold: u32,
    pub recovery_threshold: u32,
}

impl Default for FileHealthConfig {
    fn default() -> Self {
        let policy = HealthPolicy::default();
        Self {
            failure_threshold: policy.failure_threshold,
            recovery_threshold: policy.recovery_threshold,
        }
    }
}

impl FileHealthConfig {
    pub fn to_policy(&self) -> HealthPolicy {
        HealthPolicy {
            failure_threshold: self.failure_threshold,
            recovery_threshold: self.recovery_threshold,
        }
    }

    pub(super) fn issues(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        for (field, value) in [
            ("health.failure_threshold", self.failure_threshold),
            ("health.recovery_threshold", self.recovery_threshold),
        ] {
            if value == 0 {
                issues.push(ConfigIssue::new(IssueSeverity::Error, field, "must be at least 1"));
            }
        }
        issues
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAlertsConfig {
    pub high_latency_ms: u64,
    pub low_success_rate: f64,
    pub unavailable_success_rate: f64,
    pub frequent_error_rate: f64,
    pub min_samples: usize,
}

impl Default for FileAlertsConfig {
    fn default() -> Self {
        let thresholds = AlertThresholds::default();
        Self {
            high_latency_ms: thresholds.high_latency.as_millis() as u64,
            low_success_rate: thresholds.low_success_rate,
            unavailable_success_rate: thresholds.unavailable_success_rate,
            frequent_error_rate: thresholds.frequent_error_rate,
            min_samples: thresholds.min_samples,
        }
    }
}

impl FileAlertsConfig {
    pub fn to_thresholds(&self) -> AlertThresholds {
        AlertThresholds {
            high_latency: Duration::from_millis(self.high_latency_ms),
            low_success_rate: self.low_success_rate,
            unavailable_success_rate: self.unavailable_success_rate,
            frequent_error_rate: self.frequent_error_rate,
            min_samples: self.min_samples,
        }
    }

    pub(super) fn issues(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        for (field, rate) in [
            ("alerts.low_success_rate", self.low_success_rate),
            ("alerts.unavailable_success_rate", self.unavailable_success_rate),
            ("alerts.frequent_error_rate", self.frequent_error_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                issues.push(ConfigIssue::new(
                    IssueSeverity::Error,
                    field,
                    format!("{} is outside 0.0..=1.0", rate),
                ));
            }
        }
        if self.unavailable_success_rate > self.low_success_rate {
            issues.push(ConfigIssue::new(
                IssueSeverity::Warning,
                "alerts.unavailable_success_rate",
                "is above low_success_rate; tool_unavailable will fire before low_success_rate",
            ));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_domain() {
        assert_eq!(FileHealthConfig::default().to_policy(), HealthPolicy::default());
        assert_eq!(
            FileAlertsConfig::default().to_thresholds(),
            AlertThresholds::default()
        );
        assert_eq!(
            FileOrchestratorConfig::default().parse_tool_mode().0,
            ToolMode::Auto
        );
    }

    #[test]
    fn test_invalid_tool_mode_reported() {
        let config = FileOrchestratorConfig {
            tool_mode: "sometimes".to_string(),
            ..Default::default()
        };
        let (mode, issues) = config.parse_tool_mode();
        assert_eq!(mode, ToolMode::Auto);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "orchestrator.tool_mode");
    }

    #[test]
    fn test_rate_out_of_range() {
        let config = FileAlertsConfig {
            low_success_rate: 1.5,
            ..Default::default()
        };
        let issues = config.issues();
        assert!(issues.iter().any(|i| i.field == "alerts.low_success_rate"
            && i.severity == IssueSeverity::Error));
    }
}
