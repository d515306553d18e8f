//! Background health probing
//!
//! One periodic task per process pings the live backend of every probed
//! tool and feeds the results into the [`HealthTracker`]. Pings for a cycle
//! run concurrently and are each bounded by the tool's timeout.

use crate::services::health_tracker::HealthTracker;
use crate::services::registry::ToolRegistry;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use toolgate_domain::{HealthState, ToolName};
use tracing::{debug, info};

/// Result of pinging one tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub tool: ToolName,
    pub ok: bool,
    pub error: Option<String>,
    pub state: HealthState,
}

pub struct HealthProber {
    registry: Arc<ToolRegistry>,
    health: Arc<HealthTracker>,
    interval: Duration,
}

impl HealthProber {
    pub fn new(registry: Arc<ToolRegistry>, health: Arc<HealthTracker>, interval: Duration) -> Self {
        Self {
            registry,
            health,
            interval,
        }
    }

    /// Run one probe cycle over every live/auto tool with a usable live backend
    pub async fn probe_once(&self) -> Vec<ProbeReport> {
        let targets: Vec<_> = self
            .registry
            .tools()
            .into_iter()
            .filter(|tool| tool.mode().is_probed() && tool.live_usable())
            .collect();

        let pings = targets.into_iter().filter_map(|tool| {
            let live = Arc::clone(tool.live()?);
            let timeout = tool.descriptor().timeout;
            let name = tool.name().clone();
            Some(async move {
                let result = match tokio::time::timeout(timeout, live.ping()).await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(_) => Err(format!("ping timed out after {}ms", timeout.as_millis())),
                };
                (name, result)
            })
        });

        join_all(pings)
            .await
            .into_iter()
            .map(|(tool, result)| {
                match &result {
                    Ok(()) => {
                        self.health.record_success(&tool);
                    }
                    Err(e) => {
                        debug!(tool = %tool, error = %e, "Probe failed");
                        self.health.record_failure(&tool);
                    }
                }
                ProbeReport {
                    state: self.health.state(&tool),
                    ok: result.is_ok(),
                    error: result.err(),
                    tool,
                }
            })
            .collect()
    }

    /// Spawn the periodic probe loop; it exits when `shutdown` is cancelled.
    ///
    /// The first cycle runs immediately.
    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_ms = self.interval.as_millis() as u64, "Health prober started");

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let reports = self.probe_once().await;
                        debug!(probed = reports.len(), "Probe cycle complete");
                    }
                }
            }

            info!("Health prober stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::config_source::EmptyConfigSource;
    use crate::ports::tool_backend::{BackendError, ToolBackend, ToolImplementations};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use toolgate_domain::{HealthPolicy, ToolDescriptor, ToolMode};

    /// Answers pings from a script; defaults to success once exhausted
    struct ScriptedPing {
        script: Mutex<VecDeque<bool>>,
        pings: AtomicUsize,
    }

    impl ScriptedPing {
        fn new(script: &[bool]) -> Self {
            Self {
                script: Mutex::new(script.iter().copied().collect()),
                pings: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ToolBackend for ScriptedPing {
        fn label(&self) -> String {
            "scripted".to_string()
        }

        async fn invoke(
            &self,
            params: &Value,
            _cancellation: CancellationToken,
        ) -> Result<Value, BackendError> {
            Ok(params.clone())
        }

        async fn ping(&self) -> Result<(), BackendError> {
            self.pings.fetch_add(1, Ordering::SeqCst);
            match self.script.lock().unwrap().pop_front() {
                Some(false) => Err(BackendError::Connection("refused".into())),
                _ => Ok(()),
            }
        }
    }

    struct Hangs;

    #[async_trait]
    impl ToolBackend for Hangs {
        fn label(&self) -> String {
            "hangs".to_string()
        }

        async fn invoke(
            &self,
            _params: &Value,
            _cancellation: CancellationToken,
        ) -> Result<Value, BackendError> {
            std::future::pending().await
        }

        async fn ping(&self) -> Result<(), BackendError> {
            std::future::pending().await
        }
    }

    fn setup(
        mode: ToolMode,
        live: Arc<dyn ToolBackend>,
    ) -> (Arc<ToolRegistry>, Arc<HealthTracker>, HealthProber) {
        let registry = Arc::new(ToolRegistry::new());
        registry
            .register(
                ToolDescriptor::new("search", mode).with_timeout(Duration::from_secs(2)),
                ToolImplementations::new()
                    .with_live(live)
                    .with_degraded(Arc::new(ScriptedPing::new(&[]))),
                &EmptyConfigSource,
            )
            .unwrap();
        let health = Arc::new(HealthTracker::new(HealthPolicy::default()));
        let prober = HealthProber::new(
            Arc::clone(&registry),
            Arc::clone(&health),
            Duration::from_secs(30),
        );
        (registry, health, prober)
    }

    #[tokio::test]
    async fn test_probe_hysteresis() {
        let backend = Arc::new(ScriptedPing::new(&[false, false, false, true, true]));
        let (_registry, health, prober) = setup(ToolMode::Auto, backend);
        let tool = ToolName::from("search");

        for _ in 0..3 {
            prober.probe_once().await;
        }
        assert_eq!(health.state(&tool), HealthState::Unhealthy);

        let reports = prober.probe_once().await;
        assert!(reports[0].ok);
        assert_eq!(reports[0].state, HealthState::Unhealthy);

        prober.probe_once().await;
        assert_eq!(health.state(&tool), HealthState::Healthy);
    }

    #[tokio::test]
    async fn test_degraded_tools_are_not_probed() {
        let backend = Arc::new(ScriptedPing::new(&[]));
        let (_registry, health, prober) = setup(ToolMode::Degraded, backend.clone());

        assert!(prober.probe_once().await.is_empty());
        assert_eq!(backend.pings.load(Ordering::SeqCst), 0);
        assert_eq!(health.state(&"search".into()), HealthState::Unknown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_ping_times_out_as_failure() {
        let (_registry, health, prober) = setup(ToolMode::Live, Arc::new(Hangs));

        let reports = prober.probe_once().await;
        assert!(!reports[0].ok);
        assert!(reports[0].error.as_deref().unwrap().contains("timed out"));
        assert_eq!(health.snapshot(&"search".into()).consecutive_failures(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_loop_stops_on_shutdown() {
        let backend = Arc::new(ScriptedPing::new(&[]));
        let (_registry, _health, prober) = setup(ToolMode::Auto, backend.clone());
        let shutdown = CancellationToken::new();

        let handle = Arc::new(prober).spawn(shutdown.clone());
        tokio::time::sleep(Duration::from_secs(65)).await;
        shutdown.cancel();
        handle.await.unwrap();

        // Immediate first tick, then at 30s and 60s
        assert_eq!(backend.pings.load(Ordering::SeqCst), 3);
    }
}
