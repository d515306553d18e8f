//! Tool configuration from TOML (`[tools.<name>]` sections)
//!
//! Each tool names its routing mode and the backends behind it:
//!
//! ```toml
//! [tools.weather]
//! description = "Current conditions by city"
//! mode = "auto"
//! timeout_ms = 5000
//! max_retries = 1
//! required_keys = ["WEATHER_API_KEY"]
//!
//! [tools.weather.live]
//! kind = "http"
//! url = "https://weather.example.com/v1/current"
//! auth_key = "WEATHER_API_KEY"
//!
//! [tools.weather.degraded]
//! kind = "canned"
//! response = { conditions = "unknown", source = "cache" }
//!
//! [tools.calculator.live]
//! kind = "command"
//! command = "python3"
//! args = ["tools/calc.py"]
//! ```

use super::{ConfigIssue, IssueSeverity};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use toolgate_domain::tool::{DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT};
use toolgate_domain::{ToolDescriptor, ToolMode};

/// Supported backend adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// JSON over HTTP POST (requires the `web-tools` feature)
    Http,
    /// Local process, JSON on stdin and stdout
    Command,
    /// Fixed response, typically a degraded substitute
    Canned,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Http => "http",
            BackendKind::Command => "command",
            BackendKind::Canned => "canned",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" | "https" => Ok(BackendKind::Http),
            "command" | "process" => Ok(BackendKind::Command),
            "canned" | "static" => Ok(BackendKind::Canned),
            other => Err(format!("unknown backend kind: {}", other)),
        }
    }
}

/// One backend of a tool (`live` or `degraded`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    /// "http", "command" or "canned"
    pub kind: String,
    /// Endpoint receiving the JSON params (http)
    pub url: Option<String>,
    /// Endpoint pinged by the health prober (http); defaults to a HEAD on `url`
    pub health_url: Option<String>,
    /// Config key whose value is sent as a bearer token (http)
    pub auth_key: Option<String>,
    /// Program to run (command)
    pub command: Option<String>,
    pub args: Vec<String>,
    pub working_dir: Option<String>,
    /// Value returned on every call (canned)
    pub response: Option<Value>,
}

impl FileBackendConfig {
    pub fn parse_kind(&self) -> Result<BackendKind, String> {
        self.kind.parse()
    }

    fn issues(&self, field: &str) -> Vec<ConfigIssue> {
        let kind = match self.parse_kind() {
            Ok(kind) => kind,
            Err(e) => {
                return vec![ConfigIssue::new(
                    IssueSeverity::Error,
                    format!("{}.kind", field),
                    format!("{} (expected http, command or canned)", e),
                )];
            }
        };

        let mut issues = Vec::new();
        match kind {
            BackendKind::Http => {
                if self.url.as_deref().is_none_or(|u| u.trim().is_empty()) {
                    issues.push(ConfigIssue::new(
                        IssueSeverity::Error,
                        format!("{}.url", field),
                        "http backends need a url",
                    ));
                }
                if !cfg!(feature = "web-tools") {
                    issues.push(ConfigIssue::new(
                        IssueSeverity::Error,
                        format!("{}.kind", field),
                        "http backends require the web-tools feature",
                    ));
                }
            }
            BackendKind::Command => {
                if self.command.as_deref().is_none_or(|c| c.trim().is_empty()) {
                    issues.push(ConfigIssue::new(
                        IssueSeverity::Error,
                        format!("{}.command", field),
                        "command backends need a command",
                    ));
                }
            }
            BackendKind::Canned => {
                if self.response.is_none() {
                    issues.push(ConfigIssue::new(
                        IssueSeverity::Warning,
                        format!("{}.response", field),
                        "no response configured; calls return null",
                    ));
                }
            }
        }
        issues
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolConfig {
    pub description: String,
    /// Overrides `orchestrator.tool_mode` for this tool
    pub mode: Option<String>,
    pub timeout_ms: u64,
    pub max_retries: u32,
    /// Config keys (looked up in the environment) the live backend needs
    pub required_keys: Vec<String>,
    pub live: Option<FileBackendConfig>,
    pub degraded: Option<FileBackendConfig>,
}

impl Default for FileToolConfig {
    fn default() -> Self {
        Self {
            description: String::new(),
            mode: None,
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            max_retries: DEFAULT_MAX_RETRIES,
            required_keys: Vec::new(),
            live: None,
            degraded: None,
        }
    }
}

impl FileToolConfig {
    /// Effective mode; an unparsable `mode` falls back to `default_mode`
    pub fn parse_mode(&self, default_mode: ToolMode) -> Result<ToolMode, String> {
        match &self.mode {
            Some(mode) => mode.parse(),
            None => Ok(default_mode),
        }
    }

    pub fn to_descriptor(&self, name: &str, default_mode: ToolMode) -> ToolDescriptor {
        let mode = self.parse_mode(default_mode).unwrap_or(default_mode);
        let mut descriptor = ToolDescriptor::new(name, mode)
            .with_description(self.description.clone())
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_max_retries(self.max_retries);
        for key in &self.required_keys {
            descriptor = descriptor.with_required_key(key.clone());
        }
        descriptor
    }

    pub(super) fn issues(&self, name: &str, default_mode: ToolMode) -> Vec<ConfigIssue> {
        let field = format!("tools.{}", name);
        let mut issues = Vec::new();

        if self.timeout_ms == 0 {
            issues.push(ConfigIssue::new(
                IssueSeverity::Error,
                format!("{}.timeout_ms", field),
                "must be greater than 0",
            ));
        }

        let mode = match self.parse_mode(default_mode) {
            Ok(mode) => mode,
            Err(e) => {
                issues.push(ConfigIssue::new(
                    IssueSeverity::Error,
                    format!("{}.mode", field),
                    e,
                ));
                default_mode
            }
        };

        if mode.uses_live() && self.live.is_none() {
            issues.push(ConfigIssue::new(
                IssueSeverity::Error,
                format!("{}.live", field),
                format!("{} mode requires a [{}.live] backend", mode, field),
            ));
        }
        if mode == ToolMode::Degraded && self.degraded.is_none() {
            issues.push(ConfigIssue::new(
                IssueSeverity::Error,
                format!("{}.degraded", field),
                format!("degraded mode requires a [{}.degraded] backend", field),
            ));
        }
        if mode == ToolMode::Auto && self.degraded.is_none() {
            issues.push(ConfigIssue::new(
                IssueSeverity::Warning,
                format!("{}.degraded", field),
                "auto mode without a substitute cannot fall back",
            ));
        }

        if let Some(live) = &self.live {
            issues.extend(live.issues(&format!("{}.live", field)));
        }
        if let Some(degraded) = &self.degraded {
            issues.extend(degraded.issues(&format!("{}.degraded", field)));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_aliases() {
        assert_eq!("HTTP".parse::<BackendKind>().unwrap(), BackendKind::Http);
        assert_eq!("static".parse::<BackendKind>().unwrap(), BackendKind::Canned);
        assert!("grpc".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_to_descriptor() {
        let tool = FileToolConfig {
            description: "Weather".to_string(),
            mode: Some("degraded".to_string()),
            timeout_ms: 2500,
            max_retries: 2,
            required_keys: vec!["WEATHER_API_KEY".to_string()],
            ..Default::default()
        };
        let descriptor = tool.to_descriptor("weather", ToolMode::Auto);
        assert_eq!(descriptor.name().as_str(), "weather");
        assert_eq!(descriptor.mode, ToolMode::Degraded);
        assert_eq!(descriptor.timeout, Duration::from_millis(2500));
        assert_eq!(descriptor.max_retries, 2);
        assert_eq!(descriptor.required_config_keys, vec!["WEATHER_API_KEY"]);
    }

    #[test]
    fn test_mode_falls_back_to_default() {
        let tool = FileToolConfig::default();
        let descriptor = tool.to_descriptor("calc", ToolMode::Live);
        assert_eq!(descriptor.mode, ToolMode::Live);
        assert_eq!(descriptor.timeout, DEFAULT_TIMEOUT);
        assert_eq!(descriptor.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_issues_for_incomplete_tool() {
        let tool = FileToolConfig {
            mode: Some("live".to_string()),
            timeout_ms: 0,
            ..Default::default()
        };
        let fields: Vec<String> = tool
            .issues("search", ToolMode::Auto)
            .into_iter()
            .map(|i| i.field)
            .collect();
        assert!(fields.contains(&"tools.search.timeout_ms".to_string()));
        assert!(fields.contains(&"tools.search.live".to_string()));
    }

    #[test]
    fn test_unknown_backend_kind() {
        let tool = FileToolConfig {
            mode: Some("degraded".to_string()),
            degraded: Some(FileBackendConfig {
                kind: "carrier-pigeon".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let issues = tool.issues("search", ToolMode::Auto);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "tools.search.degraded.kind");
        assert_eq!(issues[0].severity, IssueSeverity::Error);
    }
}
