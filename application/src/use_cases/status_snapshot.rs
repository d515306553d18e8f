//! Status snapshot
//!
//! Serializable point-in-time view of every registered tool: mode,
//! availability, health, window statistics and alert states, plus the most
//! recent alert transitions.

use crate::services::alert_manager::AlertManager;
use crate::services::health_tracker::HealthTracker;
use crate::services::metrics_store::MetricsStore;
use crate::services::registry::ToolRegistry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use toolgate_domain::{AlertEvent, AlertState, ConnectionHealth, ToolMode, ToolName, WindowStats};

/// Number of alert transitions included in a snapshot
pub const SNAPSHOT_ALERT_EVENTS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolStatus {
    pub name: ToolName,
    pub mode: ToolMode,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_config: Vec<String>,
    pub health: ConnectionHealth,
    pub stats: WindowStats,
    pub alerts: Vec<AlertState>,
}

impl ToolStatus {
    pub fn firing_alerts(&self) -> impl Iterator<Item = &AlertState> {
        self.alerts.iter().filter(|a| a.is_firing())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub generated_at: DateTime<Utc>,
    pub tools: Vec<ToolStatus>,
    /// Most recent alert transitions, oldest first
    pub recent_alerts: Vec<AlertEvent>,
}

impl StatusSnapshot {
    pub fn collect(
        registry: &ToolRegistry,
        health: &HealthTracker,
        metrics: &MetricsStore,
        alerts: &AlertManager,
    ) -> Self {
        let tools = registry
            .tools()
            .iter()
            .map(|tool| {
                let name = tool.name();
                ToolStatus {
                    name: name.clone(),
                    mode: tool.mode(),
                    available: tool.is_available(),
                    missing_config: tool.missing_config().to_vec(),
                    health: health.snapshot(name),
                    stats: metrics.stats(name),
                    alerts: alerts.states(name),
                }
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            tools,
            recent_alerts: alerts.recent(SNAPSHOT_ALERT_EVENTS),
        }
    }

    pub fn tool(&self, name: &str) -> Option<&ToolStatus> {
        self.tools.iter().find(|t| t.name.as_str() == name)
    }

    /// Number of firing alerts across all tools
    pub fn firing_count(&self) -> usize {
        self.tools.iter().map(|t| t.firing_alerts().count()).sum()
    }
}
