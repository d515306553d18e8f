//! Raw TOML configuration data types
//!
//! These structs mirror the config file exactly. They deserialize with
//! defaults for every missing field and are converted into domain and
//! application types after [`FileConfig::validate`] has reported problems.

mod orchestrator;
mod tools;

pub use orchestrator::{FileAlertsConfig, FileHealthConfig, FileOrchestratorConfig};
pub use tools::{BackendKind, FileBackendConfig, FileToolConfig};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use toolgate_application::OrchestratorConfig;
use toolgate_domain::ToolMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    /// The value is ignored or the tool cannot be registered
    Error,
    /// Accepted, but probably not what was intended
    Warning,
}

/// A problem found while validating the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigIssue {
    pub severity: IssueSeverity,
    /// Dotted path of the offending field, e.g. `tools.search.timeout_ms`
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    pub fn new(
        severity: IssueSeverity,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == IssueSeverity::Error
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub orchestrator: FileOrchestratorConfig,
    pub health: FileHealthConfig,
    pub alerts: FileAlertsConfig,
    /// Tool definitions keyed by tool name
    pub tools: BTreeMap<String, FileToolConfig>,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.orchestrator.issues());
        issues.extend(self.health.issues());
        issues.extend(self.alerts.issues());

        let default_mode = self.default_mode();
        for (name, tool) in &self.tools {
            if name.trim().is_empty() {
                issues.push(ConfigIssue::new(
                    IssueSeverity::Error,
                    "tools",
                    "tool names must not be empty",
                ));
                continue;
            }
            issues.extend(tool.issues(name, default_mode));
        }
        issues
    }

    /// Mode for tools that do not set their own
    pub fn default_mode(&self) -> ToolMode {
        self.orchestrator.parse_tool_mode().0
    }

    /// Force every tool into `mode`, dropping per-tool settings
    pub fn override_mode(&mut self, mode: ToolMode) {
        self.orchestrator.tool_mode = mode.as_str().to_string();
        for tool in self.tools.values_mut() {
            tool.mode = None;
        }
    }

    pub fn to_orchestrator_config(&self) -> OrchestratorConfig {
        let mut config = OrchestratorConfig::default()
            .with_health_policy(self.health.to_policy())
            .with_probe_interval(self.orchestrator.probe_interval())
            .with_window_capacity(self.orchestrator.window_capacity.max(1))
            .with_alert_thresholds(self.alerts.to_thresholds())
            .with_alert_history(self.orchestrator.alert_history.max(1));
        if !self.orchestrator.probe_enabled {
            config = config.without_probing();
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[orchestrator]
tool_mode = "live"
probe_interval_ms = 5000
window_capacity = 50
invocation_log = "logs/invocations.jsonl"

[health]
failure_threshold = 5

[alerts]
high_latency_ms = 1500

[tools.search]
description = "Web search"
mode = "auto"
timeout_ms = 3000
max_retries = 2
required_keys = ["SEARCH_API_KEY"]

[tools.search.live]
kind = "command"
command = "search-cli"
args = ["--json"]

[tools.search.degraded]
kind = "canned"
response = { results = [] }
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_mode(), ToolMode::Live);
        assert_eq!(config.health.failure_threshold, 5);
        assert_eq!(config.health.recovery_threshold, 2);
        assert_eq!(
            config.orchestrator.invocation_log.as_deref(),
            Some("logs/invocations.jsonl")
        );

        let search = &config.tools["search"];
        assert_eq!(search.max_retries, 2);
        assert_eq!(search.live.as_ref().unwrap().args, vec!["--json"]);
        assert!(search.degraded.as_ref().unwrap().response.is_some());
        assert!(config.validate().is_empty());

        let orchestrator = config.to_orchestrator_config();
        assert_eq!(orchestrator.probe_interval, Duration::from_secs(5));
        assert_eq!(orchestrator.window_capacity, 50);
        assert_eq!(orchestrator.health.failure_threshold, 5);
        assert_eq!(
            orchestrator.alert_thresholds.high_latency,
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn test_default_config() {
        let config = FileConfig::default();
        assert!(config.tools.is_empty());
        assert_eq!(config.default_mode(), ToolMode::Auto);
        assert!(config.validate().is_empty());
        assert!(config.to_orchestrator_config().probe_enabled);
    }

    #[test]
    fn test_override_mode_applies_to_every_tool() {
        let toml_str = r#"
[orchestrator]
tool_mode = "auto"

[tools.search]
mode = "live"

[tools.calc]
"#;
        let mut config: FileConfig = toml::from_str(toml_str).unwrap();
        config.override_mode(ToolMode::Degraded);

        assert_eq!(config.default_mode(), ToolMode::Degraded);
        for (name, tool) in &config.tools {
            assert_eq!(
                tool.to_descriptor(name, config.default_mode()).mode,
                ToolMode::Degraded
            );
        }
    }

    #[test]
    fn test_probing_disabled() {
        let config: FileConfig = toml::from_str("[orchestrator]\nprobe_enabled = false\n").unwrap();
        assert!(!config.to_orchestrator_config().probe_enabled);
    }

    #[test]
    fn test_validate_collects_issues_across_sections() {
        let toml_str = r#"
[orchestrator]
tool_mode = "sometimes"

[health]
recovery_threshold = 0

[tools.calc]
mode = "degraded"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let issues = config.validate();
        let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
        assert!(fields.contains(&"orchestrator.tool_mode"));
        assert!(fields.contains(&"health.recovery_threshold"));
        assert!(fields.contains(&"tools.calc.degraded"));
        assert!(issues.iter().all(ConfigIssue::is_error));
    }
}
