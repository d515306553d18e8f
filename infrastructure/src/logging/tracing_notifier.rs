//! Alert notifier that reports transitions through `tracing`

use toolgate_application::AlertNotifier;
use toolgate_domain::{AlertEvent, AlertTransition, Severity};
use tracing::{error, info, warn};

/// Logs fired alerts at `warn` (`error` for critical rules) and resolutions at `info`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAlertNotifier;

impl AlertNotifier for TracingAlertNotifier {
    fn notify(&self, event: &AlertEvent) {
        match (event.transition, event.severity) {
            (AlertTransition::Fired, Severity::Critical) => error!(
                rule = %event.rule_id,
                tool = %event.tool_name,
                severity = %event.severity,
                "Alert fired: {}",
                event.detail
            ),
            (AlertTransition::Fired, Severity::Warning) => warn!(
                rule = %event.rule_id,
                tool = %event.tool_name,
                severity = %event.severity,
                "Alert fired: {}",
                event.detail
            ),
            (AlertTransition::Resolved, _) => info!(
                rule = %event.rule_id,
                tool = %event.tool_name,
                "Alert resolved: {}",
                event.detail
            ),
        }
    }
}
