//! Tool domain value objects: the immutable record of one call.
//!
//! An [`Invocation`] is what the caller sees after a dispatch completes:
//! exactly one [`InvocationOutcome`], the [`UsedMode`] that produced it and,
//! for substitute results, a [`DegradedModeNotice`]. Fallback sequences
//! (live failure followed by the degraded substitute) still produce a single
//! invocation describing the final, caller-visible result.

use super::entities::ToolName;
use super::mode::UsedMode;
use crate::core::error::ToolError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier of an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationId(Uuid);

impl InvocationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Final outcome of an invocation.
///
/// `ConfigError` means "never attempted": it is tallied separately and is
/// excluded from success-rate denominators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationOutcome {
    Success,
    Timeout,
    Error,
    ConfigError,
}

impl InvocationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, InvocationOutcome::Success)
    }

    /// Timeouts and errors; config errors are not failures of an attempt
    pub fn is_failure(&self) -> bool {
        matches!(self, InvocationOutcome::Timeout | InvocationOutcome::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationOutcome::Success => "success",
            InvocationOutcome::Timeout => "timeout",
            InvocationOutcome::Error => "error",
            InvocationOutcome::ConfigError => "config_error",
        }
    }

    fn from_error(error: &ToolError) -> Self {
        match error {
            ToolError::Timeout { .. } => InvocationOutcome::Timeout,
            ToolError::Configuration { .. } => InvocationOutcome::ConfigError,
            _ => InvocationOutcome::Error,
        }
    }
}

impl std::fmt::Display for InvocationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a result came from the degraded substitute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedReason {
    /// The tool is configured in degraded mode
    ForcedDegraded,
    /// Auto mode skipped the live backend because it is known unhealthy
    BackendUnhealthy,
    /// Auto mode fell back after the live attempt(s) failed
    LiveFailed,
}

impl DegradedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DegradedReason::ForcedDegraded => "forced_degraded",
            DegradedReason::BackendUnhealthy => "backend_unhealthy",
            DegradedReason::LiveFailed => "live_failed",
        }
    }
}

/// Informational flag attached to a substitute result.
///
/// Not an error: callers use it to show reduced-confidence indicators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedModeNotice {
    pub reason: DegradedReason,
    /// The live failure that triggered the fallback, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_error: Option<String>,
}

impl DegradedModeNotice {
    pub fn new(reason: DegradedReason) -> Self {
        Self {
            reason,
            live_error: None,
        }
    }

    pub fn after_live_failure(error: &ToolError) -> Self {
        Self {
            reason: DegradedReason::LiveFailed,
            live_error: Some(error.to_string()),
        }
    }
}

/// Successful caller-visible value of an invocation
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationValue {
    pub value: Value,
    pub used_mode: UsedMode,
    pub notice: Option<DegradedModeNotice>,
}

impl InvocationValue {
    pub fn is_degraded(&self) -> bool {
        self.notice.is_some()
    }
}

/// One completed, caller-visible call of a tool.
///
/// Timestamps are set together by [`timed`](Self::timed), so
/// `completed_at >= requested_at` holds by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    pub id: InvocationId,
    pub tool_name: ToolName,
    pub requested_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Caller-visible elapsed time, including any fallback
    #[serde(with = "crate::util::duration_ms", rename = "latency_ms")]
    pub latency: Duration,
    pub outcome: InvocationOutcome,
    pub used_mode: UsedMode,
    /// Number of live attempts made (0 when the live backend was skipped)
    pub live_attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded_notice: Option<DegradedModeNotice>,
}

impl Invocation {
    /// A successful invocation returning `value`
    pub fn success(tool_name: ToolName, used_mode: UsedMode, value: Value) -> Self {
        let now = Utc::now();
        Self {
            id: InvocationId::new(),
            tool_name,
            requested_at: now,
            completed_at: now,
            latency: Duration::ZERO,
            outcome: InvocationOutcome::Success,
            used_mode,
            live_attempts: 0,
            result: Some(value),
            error: None,
            degraded_notice: None,
        }
    }

    /// A failed invocation; the outcome is derived from the error kind
    pub fn failure(tool_name: ToolName, used_mode: UsedMode, error: ToolError) -> Self {
        let now = Utc::now();
        Self {
            id: InvocationId::new(),
            tool_name,
            requested_at: now,
            completed_at: now,
            latency: Duration::ZERO,
            outcome: InvocationOutcome::from_error(&error),
            used_mode,
            live_attempts: 0,
            result: None,
            error: Some(error),
            degraded_notice: None,
        }
    }

    /// Stamp the request time and the caller-visible latency
    pub fn timed(mut self, requested_at: DateTime<Utc>, latency: Duration) -> Self {
        self.requested_at = requested_at;
        self.latency = latency;
        self.completed_at = requested_at
            + chrono::Duration::from_std(latency).unwrap_or(chrono::Duration::zero());
        self
    }

    pub fn with_live_attempts(mut self, attempts: u32) -> Self {
        self.live_attempts = attempts;
        self
    }

    pub fn with_notice(mut self, notice: DegradedModeNotice) -> Self {
        self.degraded_notice = Some(notice);
        self
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded_notice.is_some()
    }

    /// Human-readable error detail, if the invocation failed
    pub fn error_detail(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }

    /// Convert into the caller-facing result, surfacing the typed error
    pub fn into_result(self) -> Result<InvocationValue, ToolError> {
        match (self.outcome, self.result, self.error) {
            (InvocationOutcome::Success, Some(value), _) => Ok(InvocationValue {
                value,
                used_mode: self.used_mode,
                notice: self.degraded_notice,
            }),
            (InvocationOutcome::Success, None, _) => Ok(InvocationValue {
                value: Value::Null,
                used_mode: self.used_mode,
                notice: self.degraded_notice,
            }),
            (_, _, Some(error)) => Err(error),
            (outcome, _, None) => Err(ToolError::ToolExecution {
                tool: self.tool_name.to_string(),
                message: format!("invocation ended with outcome {}", outcome),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_round_trip_value() {
        let invocation = Invocation::success("calculator".into(), UsedMode::Live, json!(42));
        assert!(invocation.is_success());
        assert!(!invocation.is_degraded());

        let value = invocation.into_result().unwrap();
        assert_eq!(value.value, json!(42));
        assert_eq!(value.used_mode, UsedMode::Live);
    }

    #[test]
    fn test_failure_outcome_from_error() {
        let timeout = Invocation::failure(
            "weather".into(),
            UsedMode::Live,
            ToolError::Timeout {
                tool: "weather".into(),
                timeout: Duration::from_secs(2),
            },
        );
        assert_eq!(timeout.outcome, InvocationOutcome::Timeout);

        let config = Invocation::failure(
            "weather".into(),
            UsedMode::Live,
            ToolError::Configuration {
                tool: "weather".into(),
                message: "missing WEATHER_API_KEY".into(),
            },
        );
        assert_eq!(config.outcome, InvocationOutcome::ConfigError);
        assert!(!config.outcome.is_failure());

        let execution = Invocation::failure(
            "search".into(),
            UsedMode::Degraded,
            ToolError::ToolExecution {
                tool: "search".into(),
                message: "empty query".into(),
            },
        );
        assert_eq!(execution.outcome, InvocationOutcome::Error);
        assert!(execution.error_detail().unwrap().contains("empty query"));
        assert!(execution.into_result().is_err());
    }

    #[test]
    fn test_timed_keeps_completion_after_request() {
        let requested_at = Utc::now();
        let invocation = Invocation::success("chart".into(), UsedMode::Degraded, json!({}))
            .timed(requested_at, Duration::from_millis(120));

        assert_eq!(invocation.requested_at, requested_at);
        assert!(invocation.completed_at >= invocation.requested_at);
        assert_eq!(
            (invocation.completed_at - invocation.requested_at).num_milliseconds(),
            120
        );
    }

    #[test]
    fn test_notice_is_visible_in_result() {
        let error = ToolError::Connection {
            tool: "search".into(),
            message: "connection refused".into(),
        };
        let value = Invocation::success("search".into(), UsedMode::Degraded, json!([]))
            .with_notice(DegradedModeNotice::after_live_failure(&error))
            .into_result()
            .unwrap();

        assert!(value.is_degraded());
        let notice = value.notice.unwrap();
        assert_eq!(notice.reason, DegradedReason::LiveFailed);
        assert!(notice.live_error.unwrap().contains("connection refused"));
    }

    #[test]
    fn test_serialized_shape() {
        let invocation = Invocation::success("calculator".into(), UsedMode::Live, json!(7))
            .timed(Utc::now(), Duration::from_millis(15))
            .with_live_attempts(1);
        let value = serde_json::to_value(&invocation).unwrap();
        assert_eq!(value["outcome"], "success");
        assert_eq!(value["used_mode"], "live");
        assert_eq!(value["latency_ms"], 15);
        assert!(value.get("error").is_none());
    }
}
