//! Bounded rolling statistics for one tool.
//!
//! [`MetricsWindow`] keeps the last `capacity` completed invocations in a ring
//! buffer (FIFO eviction by count). Counters are maintained incrementally on
//! push and eviction, so they always equal what a full scan of the window
//! would produce. Config errors never enter the window; they are tallied on
//! the side because they represent calls that were never attempted.

use crate::tool::{Invocation, InvocationOutcome, ToolName, UsedMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Default number of invocations kept per tool
pub const DEFAULT_WINDOW_CAPACITY: usize = 200;

/// One completed invocation as seen by the statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub completed_at: DateTime<Utc>,
    pub outcome: InvocationOutcome,
    pub used_mode: UsedMode,
    pub latency: Duration,
}

impl From<&Invocation> for Sample {
    fn from(invocation: &Invocation) -> Self {
        Self {
            completed_at: invocation.completed_at,
            outcome: invocation.outcome,
            used_mode: invocation.used_mode,
            latency: invocation.latency,
        }
    }
}

/// Derived statistics over the current window contents.
///
/// Rates and latencies are `None` when there is not enough data to compute
/// them (no attempted invocations, or no successful ones for latency).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    /// Invocations ever recorded, including evicted ones and config errors
    pub recorded: u64,
    pub total: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub timeout_count: usize,
    pub degraded_count: usize,
    /// Calls rejected for missing configuration (outside the window)
    pub config_error_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_rate: Option<f64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "crate::util::option_duration_ms",
        rename = "avg_latency_ms",
        default
    )]
    pub avg_latency: Option<Duration>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "crate::util::option_duration_ms",
        rename = "min_latency_ms",
        default
    )]
    pub min_latency: Option<Duration>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "crate::util::option_duration_ms",
        rename = "max_latency_ms",
        default
    )]
    pub max_latency: Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_completed_at: Option<DateTime<Utc>>,
}

impl WindowStats {
    /// True when no attempted invocation has been recorded yet
    pub fn is_insufficient(&self) -> bool {
        self.success_count + self.failure_count == 0
    }
}

/// Rolling statistics store for a single tool.
#[derive(Debug, Clone)]
pub struct MetricsWindow {
    tool_name: ToolName,
    capacity: usize,
    samples: VecDeque<Sample>,
    success_count: usize,
    failure_count: usize,
    timeout_count: usize,
    degraded_count: usize,
    success_latency_total: Duration,
    config_error_count: u64,
    recorded: u64,
}

impl MetricsWindow {
    /// Create an empty window; a zero capacity is raised to one.
    pub fn new(tool_name: ToolName, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            tool_name,
            capacity,
            samples: VecDeque::with_capacity(capacity),
            success_count: 0,
            failure_count: 0,
            timeout_count: 0,
            degraded_count: 0,
            success_latency_total: Duration::ZERO,
            config_error_count: 0,
            recorded: 0,
        }
    }

    pub fn tool_name(&self) -> &ToolName {
        &self.tool_name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Record a completed invocation.
    ///
    /// Config errors only bump the side tally. Everything else is appended,
    /// evicting the oldest sample when the window is full.
    pub fn record(&mut self, invocation: &Invocation) {
        self.recorded = self.recorded.saturating_add(1);
        if invocation.outcome == InvocationOutcome::ConfigError {
            self.config_error_count = self.config_error_count.saturating_add(1);
            return;
        }

        if self.samples.len() == self.capacity
            && let Some(evicted) = self.samples.pop_front()
        {
            self.account(&evicted, false);
        }

        let sample = Sample::from(invocation);
        self.account(&sample, true);
        self.samples.push_back(sample);
    }

    /// Compute the current statistics
    pub fn stats(&self) -> WindowStats {
        let attempted = self.success_count + self.failure_count;
        let (success_rate, failure_rate) = if attempted == 0 {
            (None, None)
        } else {
            (
                Some(self.success_count as f64 / attempted as f64),
                Some(self.failure_count as f64 / attempted as f64),
            )
        };

        let avg_latency = if self.success_count == 0 {
            None
        } else {
            Some(self.success_latency_total / self.success_count as u32)
        };

        let successes = || {
            self.samples
                .iter()
                .filter(|s| s.outcome.is_success())
                .map(|s| s.latency)
        };

        WindowStats {
            recorded: self.recorded,
            total: self.samples.len(),
            success_count: self.success_count,
            failure_count: self.failure_count,
            timeout_count: self.timeout_count,
            degraded_count: self.degraded_count,
            config_error_count: self.config_error_count,
            success_rate,
            failure_rate,
            avg_latency,
            min_latency: successes().min(),
            max_latency: successes().max(),
            last_completed_at: self.samples.back().map(|s| s.completed_at),
        }
    }

    fn account(&mut self, sample: &Sample, added: bool) {
        let adjust = |count: &mut usize| {
            if added {
                *count += 1;
            } else {
                *count = count.saturating_sub(1);
            }
        };

        match sample.outcome {
            InvocationOutcome::Success => {
                adjust(&mut self.success_count);
                if added {
                    self.success_latency_total += sample.latency;
                } else {
                    self.success_latency_total =
                        self.success_latency_total.saturating_sub(sample.latency);
                }
            }
            InvocationOutcome::Timeout => {
                adjust(&mut self.failure_count);
                adjust(&mut self.timeout_count);
            }
            InvocationOutcome::Error => adjust(&mut self.failure_count),
            InvocationOutcome::ConfigError => {}
        }

        if sample.used_mode == UsedMode::Degraded {
            adjust(&mut self.degraded_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ToolError;
    use serde_json::json;

    fn success(latency_ms: u64) -> Invocation {
        Invocation::success("search".into(), UsedMode::Live, json!("ok"))
            .timed(Utc::now(), Duration::from_millis(latency_ms))
    }

    fn timeout() -> Invocation {
        Invocation::failure(
            "search".into(),
            UsedMode::Live,
            ToolError::Timeout {
                tool: "search".into(),
                timeout: Duration::from_secs(5),
            },
        )
        .timed(Utc::now(), Duration::from_secs(5))
    }

    fn config_error() -> Invocation {
        Invocation::failure(
            "search".into(),
            UsedMode::Live,
            ToolError::Configuration {
                tool: "search".into(),
                message: "missing SEARCH_API_KEY".into(),
            },
        )
    }

    #[test]
    fn test_empty_window_is_insufficient() {
        let window = MetricsWindow::new("search".into(), 10);
        let stats = window.stats();
        assert!(stats.is_insufficient());
        assert_eq!(stats.success_rate, None);
        assert_eq!(stats.avg_latency, None);
    }

    #[test]
    fn test_latency_only_over_successes() {
        let mut window = MetricsWindow::new("search".into(), 10);
        window.record(&success(100));
        window.record(&success(300));
        window.record(&timeout());

        let stats = window.stats();
        assert_eq!(stats.success_count, 2);
        assert_eq!(stats.failure_count, 1);
        assert_eq!(stats.timeout_count, 1);
        assert_eq!(stats.avg_latency, Some(Duration::from_millis(200)));
        assert_eq!(stats.min_latency, Some(Duration::from_millis(100)));
        assert_eq!(stats.max_latency, Some(Duration::from_millis(300)));
    }

    #[test]
    fn test_config_errors_excluded_from_rate() {
        let mut window = MetricsWindow::new("search".into(), 10);
        window.record(&success(10));
        window.record(&config_error());
        window.record(&config_error());

        let stats = window.stats();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.recorded, 3);
        assert_eq!(stats.config_error_count, 2);
        assert_eq!(stats.success_rate, Some(1.0));
    }

    #[test]
    fn test_only_config_errors_is_still_insufficient() {
        let mut window = MetricsWindow::new("search".into(), 10);
        window.record(&config_error());
        assert!(window.stats().is_insufficient());
        assert!(window.is_empty());
    }

    #[test]
    fn test_eviction_keeps_counts_consistent() {
        let mut window = MetricsWindow::new("search".into(), 3);
        window.record(&timeout());
        window.record(&timeout());
        window.record(&success(50));
        window.record(&success(50));
        window.record(&success(50));

        let stats = window.stats();
        assert_eq!(window.len(), 3);
        assert_eq!(stats.success_count, 3);
        assert_eq!(stats.failure_count, 0);
        assert_eq!(stats.success_rate, Some(1.0));
        assert_eq!(stats.avg_latency, Some(Duration::from_millis(50)));
    }

    #[test]
    fn test_degraded_count() {
        let mut window = MetricsWindow::new("weather".into(), 5);
        window.record(
            &Invocation::success("weather".into(), UsedMode::Degraded, json!({}))
                .timed(Utc::now(), Duration::from_millis(1)),
        );
        window.record(&success(10));
        assert_eq!(window.stats().degraded_count, 1);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let window = MetricsWindow::new("search".into(), 0);
        assert_eq!(window.capacity(), 1);
    }
}
