//! Alert rules over window statistics.

use crate::metrics::WindowStats;
use crate::util::duration_ms;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Configurable thresholds for the built-in rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// `high_latency` fires when the average successful latency exceeds this
    #[serde(with = "duration_ms", rename = "high_latency_ms")]
    pub high_latency: Duration,
    /// `low_success_rate` fires below this rate
    pub low_success_rate: f64,
    /// `tool_unavailable` fires below this rate
    pub unavailable_success_rate: f64,
    /// `frequent_errors` fires above this failure ratio
    pub frequent_error_rate: f64,
    /// Attempted invocations required before rate rules may fire
    pub min_samples: usize,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            high_latency: Duration::from_secs(5),
            low_success_rate: 0.8,
            unavailable_success_rate: 0.1,
            frequent_error_rate: 0.2,
            min_samples: 10,
        }
    }
}

/// Identifier of a built-in alert rule.
///
/// | Rule | Condition | Severity |
/// |------|-----------|----------|
/// | `high_latency` | avg latency > threshold | warning |
/// | `low_success_rate` | success rate < threshold, ≥ min samples | warning |
/// | `tool_unavailable` | success rate < threshold, ≥ min samples | critical |
/// | `frequent_errors` | failures / total > threshold | warning |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertRuleId {
    HighLatency,
    LowSuccessRate,
    ToolUnavailable,
    FrequentErrors,
}

impl AlertRuleId {
    /// Every built-in rule, in evaluation order
    pub const ALL: [AlertRuleId; 4] = [
        AlertRuleId::HighLatency,
        AlertRuleId::LowSuccessRate,
        AlertRuleId::ToolUnavailable,
        AlertRuleId::FrequentErrors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertRuleId::HighLatency => "high_latency",
            AlertRuleId::LowSuccessRate => "low_success_rate",
            AlertRuleId::ToolUnavailable => "tool_unavailable",
            AlertRuleId::FrequentErrors => "frequent_errors",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            AlertRuleId::ToolUnavailable => Severity::Critical,
            _ => Severity::Warning,
        }
    }

    /// Whether the rule's condition holds for `stats`.
    ///
    /// Comparisons are strict: a success rate of exactly the threshold does
    /// not fire. Missing data never fires.
    pub fn condition(&self, stats: &WindowStats, thresholds: &AlertThresholds) -> bool {
        let attempted = stats.success_count + stats.failure_count;
        match self {
            AlertRuleId::HighLatency => stats
                .avg_latency
                .is_some_and(|avg| avg > thresholds.high_latency),
            AlertRuleId::LowSuccessRate => {
                attempted >= thresholds.min_samples
                    && stats
                        .success_rate
                        .is_some_and(|rate| rate < thresholds.low_success_rate)
            }
            AlertRuleId::ToolUnavailable => {
                attempted >= thresholds.min_samples
                    && stats
                        .success_rate
                        .is_some_and(|rate| rate < thresholds.unavailable_success_rate)
            }
            AlertRuleId::FrequentErrors => stats
                .failure_rate
                .is_some_and(|rate| rate > thresholds.frequent_error_rate),
        }
    }
}

impl fmt::Display for AlertRuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
