//! Tool domain entities

use super::mode::ToolMode;
use crate::util::duration_ms;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default timeout for a live attempt
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of additional live attempts after a liveness failure
pub const DEFAULT_MAX_RETRIES: u32 = 0;

/// Unique, immutable name of a registered tool (e.g. "weather").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolName(String);

impl ToolName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ToolName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ToolName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::borrow::Borrow<str> for ToolName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Static description of one named capability.
///
/// The name is fixed at construction; everything else is routing policy.
/// `required_config_keys` lists the configuration entries (API keys and the
/// like) the live backend needs; the registry checks them at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    name: ToolName,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Routing policy
    pub mode: ToolMode,
    /// Timeout applied to each live attempt
    #[serde(with = "duration_ms", rename = "timeout_ms")]
    pub timeout: Duration,
    /// Additional live attempts after a connection failure or timeout
    pub max_retries: u32,
    /// Configuration keys that must be set for the live backend to be usable
    #[serde(default)]
    pub required_config_keys: Vec<String>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<ToolName>, mode: ToolMode) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            mode,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            required_config_keys: Vec::new(),
        }
    }

    pub fn name(&self) -> &ToolName {
        &self.name
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_required_key(mut self, key: impl Into<String>) -> Self {
        self.required_config_keys.push(key.into());
        self
    }

    /// Total number of live attempts a single call may make
    pub fn max_live_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder() {
        let descriptor = ToolDescriptor::new("weather", ToolMode::Auto)
            .with_description("Current conditions")
            .with_timeout(Duration::from_secs(3))
            .with_max_retries(2)
            .with_required_key("WEATHER_API_KEY");

        assert_eq!(descriptor.name().as_str(), "weather");
        assert_eq!(descriptor.timeout, Duration::from_secs(3));
        assert_eq!(descriptor.max_live_attempts(), 3);
        assert_eq!(descriptor.required_config_keys, vec!["WEATHER_API_KEY"]);
    }

    #[test]
    fn test_descriptor_defaults() {
        let descriptor = ToolDescriptor::new("calculator", ToolMode::Degraded);
        assert_eq!(descriptor.timeout, DEFAULT_TIMEOUT);
        assert_eq!(descriptor.max_live_attempts(), 1);
        assert!(descriptor.required_config_keys.is_empty());
    }

    #[test]
    fn test_descriptor_serializes_timeout_as_millis() {
        let descriptor =
            ToolDescriptor::new("search", ToolMode::Live).with_timeout(Duration::from_millis(750));
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["name"], "search");
        assert_eq!(value["mode"], "live");
        assert_eq!(value["timeout_ms"], 750);
    }
}
