//! Per-tool metrics windows
//!
//! Each tool's [`MetricsWindow`] sits behind its own mutex. `record` returns
//! the statistics computed under that same lock, so alert evaluation always
//! sees a consistent view of the window it just updated.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use toolgate_domain::{Invocation, MetricsWindow, ToolName, WindowStats};

pub struct MetricsStore {
    capacity: usize,
    windows: RwLock<HashMap<ToolName, Arc<Mutex<MetricsWindow>>>>,
}

impl MetricsStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Append one completed invocation and return the updated statistics
    pub fn record(&self, invocation: &Invocation) -> WindowStats {
        let window = self.window(&invocation.tool_name);
        let mut window = window.lock().unwrap_or_else(PoisonError::into_inner);
        window.record(invocation);
        window.stats()
    }

    /// Statistics for a tool; empty when nothing has been recorded
    pub fn stats(&self, tool: &ToolName) -> WindowStats {
        let window = self
            .windows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tool)
            .cloned();
        window
            .map(|w| w.lock().unwrap_or_else(PoisonError::into_inner).stats())
            .unwrap_or_default()
    }

    fn window(&self, tool: &ToolName) -> Arc<Mutex<MetricsWindow>> {
        if let Some(window) = self
            .windows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tool)
        {
            return Arc::clone(window);
        }
        let mut windows = self.windows.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            windows
                .entry(tool.clone())
                .or_insert_with(|| Arc::new(Mutex::new(MetricsWindow::new(tool.clone(), self.capacity)))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use std::time::Duration;
    use toolgate_domain::UsedMode;

    #[test]
    fn test_record_returns_fresh_stats() {
        let store = MetricsStore::new(10);
        let invocation = Invocation::success("search".into(), UsedMode::Live, json!(1))
            .timed(Utc::now(), Duration::from_millis(40));

        let stats = store.record(&invocation);
        assert_eq!(stats.success_count, 1);
        assert_eq!(stats.recorded, 1);
        assert_eq!(store.stats(&"search".into()), stats);
    }

    #[test]
    fn test_unknown_tool_has_empty_stats() {
        let store = MetricsStore::new(10);
        assert!(store.stats(&"search".into()).is_insufficient());
    }
}
