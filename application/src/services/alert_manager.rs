//! Alert evaluation
//!
//! After every window update the dispatcher hands the fresh [`WindowStats`]
//! to [`AlertManager::evaluate`]. Each built-in rule has one [`AlertState`]
//! per tool; only transitions produce events, which are appended to a
//! bounded history and passed to the [`AlertNotifier`].

use crate::ports::alert_notifier::AlertNotifier;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use toolgate_domain::{AlertEvent, AlertRuleId, AlertState, AlertThresholds, ToolName, WindowStats};
use tracing::debug;

struct ToolAlerts {
    /// `WindowStats::recorded` of the last evaluated stats
    last_recorded: u64,
    states: Vec<AlertState>,
}

impl ToolAlerts {
    fn new(tool: &ToolName) -> Self {
        Self {
            last_recorded: 0,
            states: AlertRuleId::ALL
                .iter()
                .map(|rule| AlertState::new(*rule, tool.clone()))
                .collect(),
        }
    }
}

pub struct AlertManager {
    thresholds: AlertThresholds,
    notifier: Arc<dyn AlertNotifier>,
    tools: RwLock<HashMap<ToolName, Arc<Mutex<ToolAlerts>>>>,
    history: Mutex<VecDeque<AlertEvent>>,
    history_limit: usize,
}

impl AlertManager {
    pub fn new(
        thresholds: AlertThresholds,
        history_limit: usize,
        notifier: Arc<dyn AlertNotifier>,
    ) -> Self {
        Self {
            thresholds,
            notifier,
            tools: RwLock::new(HashMap::new()),
            history: Mutex::new(VecDeque::new()),
            history_limit: history_limit.max(1),
        }
    }

    pub fn thresholds(&self) -> &AlertThresholds {
        &self.thresholds
    }

    /// Evaluate every rule for `tool` against `stats`.
    ///
    /// Stats older than the last evaluated ones (a concurrent invocation
    /// finished evaluating first) are ignored. Returns the transitions that
    /// happened, which have already been recorded and notified.
    pub fn evaluate(&self, tool: &ToolName, stats: &WindowStats) -> Vec<AlertEvent> {
        let now = Utc::now();
        let events: Vec<AlertEvent> = {
            let entry = self.entry(tool);
            let mut alerts = entry.lock().unwrap_or_else(PoisonError::into_inner);
            if stats.recorded < alerts.last_recorded {
                debug!(tool = %tool, "Skipping stale alert evaluation");
                return Vec::new();
            }
            alerts.last_recorded = stats.recorded;

            alerts
                .states
                .iter_mut()
                .filter_map(|state| {
                    let condition = state.rule_id.condition(stats, &self.thresholds);
                    state.evaluate(condition, now).map(|transition| AlertEvent {
                        rule_id: state.rule_id,
                        tool_name: tool.clone(),
                        severity: state.severity,
                        transition,
                        at: now,
                        detail: describe(state.rule_id, stats, &self.thresholds),
                    })
                })
                .collect()
        };

        if events.is_empty() {
            return events;
        }

        {
            let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
            for event in &events {
                if history.len() == self.history_limit {
                    history.pop_front();
                }
                history.push_back(event.clone());
            }
        }
        for event in &events {
            self.notifier.notify(event);
        }
        events
    }

    /// Alert states for one tool, in rule order
    pub fn states(&self, tool: &ToolName) -> Vec<AlertState> {
        let entry = self
            .tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tool)
            .cloned();
        match entry {
            Some(entry) => entry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .states
                .clone(),
            None => ToolAlerts::new(tool).states,
        }
    }

    /// Every firing alert across all tools
    pub fn firing(&self) -> Vec<AlertState> {
        let entries: Vec<_> = self
            .tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        let mut firing: Vec<AlertState> = entries
            .iter()
            .flat_map(|entry| {
                entry
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .states
                    .iter()
                    .filter(|s| s.is_firing())
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        firing.sort_by(|a, b| (&a.tool_name, a.rule_id).cmp(&(&b.tool_name, b.rule_id)));
        firing
    }

    /// Alert history, oldest first
    pub fn history(&self) -> Vec<AlertEvent> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// The `limit` most recent transitions, oldest first
    pub fn recent(&self, limit: usize) -> Vec<AlertEvent> {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let skip = history.len().saturating_sub(limit);
        history.iter().skip(skip).cloned().collect()
    }

    fn entry(&self, tool: &ToolName) -> Arc<Mutex<ToolAlerts>> {
        if let Some(entry) = self
            .tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tool)
        {
            return Arc::clone(entry);
        }
        let mut tools = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            tools
                .entry(tool.clone())
                .or_insert_with(|| Arc::new(Mutex::new(ToolAlerts::new(tool)))),
        )
    }
}

fn describe(rule: AlertRuleId, stats: &WindowStats, thresholds: &AlertThresholds) -> String {
    let attempted = stats.success_count + stats.failure_count;
    let percent = |rate: Option<f64>| rate.map(|r| format!("{:.1}%", r * 100.0));
    match rule {
        AlertRuleId::HighLatency => format!(
            "avg latency {}ms (threshold {}ms) over {} successes",
            stats.avg_latency.map(|d| d.as_millis()).unwrap_or(0),
            thresholds.high_latency.as_millis(),
            stats.success_count
        ),
        AlertRuleId::LowSuccessRate | AlertRuleId::ToolUnavailable => format!(
            "success rate {} over {} samples",
            percent(stats.success_rate).unwrap_or_else(|| "n/a".to_string()),
            attempted
        ),
        AlertRuleId::FrequentErrors => format!(
            "{} failures ({} timeouts) in {} samples",
            stats.failure_count, stats.timeout_count, attempted
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::alert_notifier::NoAlertNotifier;
    use std::time::Duration;
    use toolgate_domain::{AlertStatus, AlertTransition};

    struct Recorder(Mutex<Vec<AlertEvent>>);

    impl AlertNotifier for Recorder {
        fn notify(&self, event: &AlertEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn stats(recorded: u64, successes: usize, failures: usize) -> WindowStats {
        let attempted = successes + failures;
        WindowStats {
            recorded,
            total: attempted,
            success_count: successes,
            failure_count: failures,
            success_rate: Some(successes as f64 / attempted as f64),
            failure_rate: Some(failures as f64 / attempted as f64),
            avg_latency: Some(Duration::from_millis(100)),
            ..Default::default()
        }
    }

    #[test]
    fn test_fires_once_and_resolves() {
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let manager = AlertManager::new(AlertThresholds::default(), 500, recorder.clone());
        let tool = ToolName::from("search");

        // 0% success over 10 samples: low_success_rate, tool_unavailable, frequent_errors
        let events = manager.evaluate(&tool, &stats(10, 0, 10));
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.transition == AlertTransition::Fired));

        // Still true: no new events
        assert!(manager.evaluate(&tool, &stats(11, 0, 11)).is_empty());

        let events = manager.evaluate(&tool, &stats(12, 12, 0));
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.transition == AlertTransition::Resolved));

        assert_eq!(recorder.0.lock().unwrap().len(), 6);
        assert_eq!(manager.history().len(), 6);
        assert!(manager.firing().is_empty());
    }

    #[test]
    fn test_refire_keeps_first_fired_at() {
        let manager = AlertManager::new(AlertThresholds::default(), 500, Arc::new(NoAlertNotifier));
        let tool = ToolName::from("search");

        manager.evaluate(&tool, &stats(10, 0, 10));
        let first = manager
            .states(&tool)
            .into_iter()
            .find(|s| s.rule_id == AlertRuleId::ToolUnavailable)
            .unwrap();
        assert_eq!(first.status(), AlertStatus::Firing);

        manager.evaluate(&tool, &stats(11, 0, 11));
        let again = manager
            .states(&tool)
            .into_iter()
            .find(|s| s.rule_id == AlertRuleId::ToolUnavailable)
            .unwrap();
        assert_eq!(again.first_fired_at(), first.first_fired_at());
        assert!(again.last_evaluated_at() >= first.last_evaluated_at());
    }

    #[test]
    fn test_eighty_percent_does_not_fire_low_success_rate() {
        let manager = AlertManager::new(AlertThresholds::default(), 500, Arc::new(NoAlertNotifier));
        let tool = ToolName::from("search");

        manager.evaluate(&tool, &stats(10, 8, 2));
        assert!(
            !manager
                .firing()
                .iter()
                .any(|s| s.rule_id == AlertRuleId::LowSuccessRate)
        );

        manager.evaluate(&tool, &stats(100, 79, 21));
        assert!(
            manager
                .firing()
                .iter()
                .any(|s| s.rule_id == AlertRuleId::LowSuccessRate)
        );
    }

    #[test]
    fn test_stale_stats_are_ignored() {
        let manager = AlertManager::new(AlertThresholds::default(), 500, Arc::new(NoAlertNotifier));
        let tool = ToolName::from("search");

        manager.evaluate(&tool, &stats(20, 20, 0));
        assert!(manager.evaluate(&tool, &stats(19, 0, 19)).is_empty());
        assert!(manager.firing().is_empty());
    }

    #[test]
    fn test_history_is_bounded() {
        let manager = AlertManager::new(AlertThresholds::default(), 2, Arc::new(NoAlertNotifier));
        manager.evaluate(&"a".into(), &stats(10, 0, 10));
        let history = manager.history();
        assert_eq!(history.len(), 2);
        assert_eq!(manager.recent(1).len(), 1);
        assert_eq!(manager.recent(1)[0], history[1]);
    }
}
