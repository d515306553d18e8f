//! Process-scoped orchestrator
//!
//! [`Orchestrator`] owns the registry, health tracker, metrics, alerts,
//! dispatcher, workflow engine and the health prober task. Build it once
//! with [`OrchestratorBuilder`], call [`start`](Orchestrator::start) to spawn
//! the prober, and [`shutdown`](Orchestrator::shutdown) to stop it.

use crate::config::OrchestratorConfig;
use crate::ports::alert_notifier::{AlertNotifier, NoAlertNotifier};
use crate::ports::config_source::ConfigSource;
use crate::ports::invocation_logger::{InvocationLogger, NoInvocationLogger};
use crate::ports::tool_backend::ToolImplementations;
use crate::services::alert_manager::AlertManager;
use crate::services::health_tracker::HealthTracker;
use crate::services::metrics_store::MetricsStore;
use crate::services::prober::{HealthProber, ProbeReport};
use crate::services::registry::ToolRegistry;
use crate::use_cases::dispatch::Dispatcher;
use crate::use_cases::run_workflow::{WorkflowEngine, WorkflowError};
use crate::use_cases::status_snapshot::StatusSnapshot;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use toolgate_domain::{Invocation, ToolDescriptor, ToolError, WorkflowDefinition, WorkflowRun};
use tracing::{info, warn};

pub struct OrchestratorBuilder {
    config: OrchestratorConfig,
    logger: Arc<dyn InvocationLogger>,
    notifier: Arc<dyn AlertNotifier>,
}

impl OrchestratorBuilder {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self {
            config,
            logger: Arc::new(NoInvocationLogger),
            notifier: Arc::new(NoAlertNotifier),
        }
    }

    pub fn with_invocation_logger(mut self, logger: Arc<dyn InvocationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_alert_notifier(mut self, notifier: Arc<dyn AlertNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn build(self) -> Orchestrator {
        let config = self.config;
        let registry = Arc::new(ToolRegistry::new());
        let health = Arc::new(HealthTracker::new(config.health));
        let metrics = Arc::new(MetricsStore::new(config.window_capacity));
        let alerts = Arc::new(AlertManager::new(
            config.alert_thresholds,
            config.alert_history,
            self.notifier,
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&registry),
            Arc::clone(&health),
            Arc::clone(&metrics),
            Arc::clone(&alerts),
            self.logger,
        ));
        let engine = WorkflowEngine::new(Arc::clone(&dispatcher), Arc::clone(&registry));
        let prober = Arc::new(HealthProber::new(
            Arc::clone(&registry),
            Arc::clone(&health),
            config.probe_interval,
        ));

        Orchestrator {
            config,
            registry,
            health,
            metrics,
            alerts,
            dispatcher,
            engine,
            prober,
            shutdown: CancellationToken::new(),
            prober_task: Mutex::new(None),
        }
    }
}

pub struct Orchestrator {
    config: OrchestratorConfig,
    registry: Arc<ToolRegistry>,
    health: Arc<HealthTracker>,
    metrics: Arc<MetricsStore>,
    alerts: Arc<AlertManager>,
    dispatcher: Arc<Dispatcher>,
    engine: WorkflowEngine,
    prober: Arc<HealthProber>,
    shutdown: CancellationToken,
    prober_task: Mutex<Option<JoinHandle<()>>>,
}

impl Orchestrator {
    pub fn builder(config: OrchestratorConfig) -> OrchestratorBuilder {
        OrchestratorBuilder::new(config)
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Register a tool; see [`ToolRegistry::register`]
    pub fn register(
        &self,
        descriptor: ToolDescriptor,
        implementations: ToolImplementations,
        config: &dyn ConfigSource,
    ) -> Result<(), ToolError> {
        self.registry.register(descriptor, implementations, config)
    }

    /// Spawn the background prober. Calling it again is a no-op.
    pub fn start(&self) {
        if !self.config.probe_enabled {
            info!("Health probing disabled");
            return;
        }
        let mut task = self.prober_task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.is_none() && !self.shutdown.is_cancelled() {
            *task = Some(Arc::clone(&self.prober).spawn(self.shutdown.child_token()));
        }
    }

    /// Stop the prober and wait for it to exit
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let task = self
            .prober_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            warn!("Health prober task ended abnormally: {}", e);
        }
    }

    pub async fn invoke(
        &self,
        tool_name: &str,
        params: Value,
        timeout: Option<Duration>,
    ) -> Result<Invocation, ToolError> {
        self.dispatcher.invoke(tool_name, params, timeout).await
    }

    pub async fn run_workflow(
        &self,
        definition: &WorkflowDefinition,
    ) -> Result<WorkflowRun, WorkflowError> {
        self.engine.run(definition).await
    }

    pub fn validate_workflow(&self, definition: &WorkflowDefinition) -> Result<(), WorkflowError> {
        self.engine.validate(definition)
    }

    /// Run one probe cycle now, outside the periodic schedule
    pub async fn probe_now(&self) -> Vec<ProbeReport> {
        self.prober.probe_once().await
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot::collect(&self.registry, &self.health, &self.metrics, &self.alerts)
    }
}
