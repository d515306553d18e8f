//! Dispatch use case
//!
//! Routes one tool call through the tool's mode policy:
//!
//! | Mode | Live attempts | Substitute |
//! |------|---------------|------------|
//! | `live` | up to `1 + max_retries` | never |
//! | `degraded` | never | always |
//! | `auto` | skipped while unhealthy | when live is skipped or fails |
//!
//! Every call produces exactly one [`Invocation`], which is recorded in the
//! tool's metrics window, evaluated for alerts and handed to the invocation
//! logger before it is returned.

use crate::ports::invocation_logger::InvocationLogger;
use crate::ports::tool_backend::ToolBackend;
use crate::services::alert_manager::AlertManager;
use crate::services::health_tracker::HealthTracker;
use crate::services::metrics_store::MetricsStore;
use crate::services::registry::{RegisteredTool, ToolRegistry};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use toolgate_domain::{
    DegradedModeNotice, DegradedReason, Invocation, ToolError, ToolMode, UsedMode,
};
use tracing::{debug, warn};

/// Result of a single backend attempt
enum AttemptOutcome {
    Success(Value),
    Failed(ToolError),
}

/// Result of the live phase of a call
struct LivePhase {
    outcome: AttemptOutcome,
    attempts: u32,
}

pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    health: Arc<HealthTracker>,
    metrics: Arc<MetricsStore>,
    alerts: Arc<AlertManager>,
    logger: Arc<dyn InvocationLogger>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ToolRegistry>,
        health: Arc<HealthTracker>,
        metrics: Arc<MetricsStore>,
        alerts: Arc<AlertManager>,
        logger: Arc<dyn InvocationLogger>,
    ) -> Self {
        Self {
            registry,
            health,
            metrics,
            alerts,
            logger,
        }
    }

    /// Invoke a tool.
    ///
    /// The only `Err` is `ToolError::UnknownTool`; every other condition is
    /// reported through the returned invocation's outcome.
    pub async fn invoke(
        &self,
        tool_name: &str,
        params: Value,
        timeout_override: Option<Duration>,
    ) -> Result<Invocation, ToolError> {
        self.invoke_with_cancellation(tool_name, params, timeout_override, CancellationToken::new())
            .await
    }

    /// Invoke a tool under a parent cancellation token.
    ///
    /// Each live attempt runs with a child of `cancellation`, so cancelling
    /// the parent (e.g. a workflow deadline) reaches the backend.
    pub async fn invoke_with_cancellation(
        &self,
        tool_name: &str,
        params: Value,
        timeout_override: Option<Duration>,
        cancellation: CancellationToken,
    ) -> Result<Invocation, ToolError> {
        let tool = self.registry.lookup(tool_name)?;
        let timeout = timeout_override.unwrap_or(tool.descriptor().timeout);

        let requested_at = Utc::now();
        let started = Instant::now();
        let invocation = self.route(&tool, &params, timeout, &cancellation).await;
        let invocation = invocation.timed(requested_at, started.elapsed());

        self.record(&invocation);
        Ok(invocation)
    }

    async fn route(
        &self,
        tool: &RegisteredTool,
        params: &Value,
        timeout: Duration,
        cancellation: &CancellationToken,
    ) -> Invocation {
        let name = tool.name().clone();
        let mode = tool.mode();

        if mode.uses_live() && !tool.is_available() {
            debug!(tool = %name, "Short-circuiting call: missing configuration");
            return Invocation::failure(
                name.clone(),
                UsedMode::Live,
                ToolError::Configuration {
                    tool: name.to_string(),
                    message: format!(
                        "missing required config: {}",
                        tool.missing_config().join(", ")
                    ),
                },
            )
            .with_live_attempts(0);
        }

        match mode {
            ToolMode::Degraded => {
                self.degraded(
                    tool,
                    params,
                    cancellation,
                    DegradedModeNotice::new(DegradedReason::ForcedDegraded),
                )
                .await
            }
            ToolMode::Live => {
                let live = self.live_phase(tool, params, timeout, cancellation).await;
                let invocation = match live.outcome {
                    AttemptOutcome::Success(value) => Invocation::success(name, UsedMode::Live, value),
                    AttemptOutcome::Failed(error) => Invocation::failure(name, UsedMode::Live, error),
                };
                invocation.with_live_attempts(live.attempts)
            }
            ToolMode::Auto => {
                if self.health.is_unhealthy(&name) {
                    debug!(tool = %name, "Backend unhealthy, using substitute");
                    return self
                        .degraded(
                            tool,
                            params,
                            cancellation,
                            DegradedModeNotice::new(DegradedReason::BackendUnhealthy),
                        )
                        .await;
                }

                let live = self.live_phase(tool, params, timeout, cancellation).await;
                let invocation = match live.outcome {
                    AttemptOutcome::Success(value) => {
                        Invocation::success(name, UsedMode::Live, value)
                    }
                    AttemptOutcome::Failed(error) => {
                        debug!(tool = %name, error = %error, "Live path failed, falling back");
                        self.degraded(
                            tool,
                            params,
                            cancellation,
                            DegradedModeNotice::after_live_failure(&error),
                        )
                        .await
                    }
                };
                invocation.with_live_attempts(live.attempts)
            }
        }
    }

    /// Live attempts with retries on liveness failures
    async fn live_phase(
        &self,
        tool: &RegisteredTool,
        params: &Value,
        timeout: Duration,
        cancellation: &CancellationToken,
    ) -> LivePhase {
        let name = tool.name();
        let Some(live) = tool.live() else {
            return LivePhase {
                outcome: AttemptOutcome::Failed(ToolError::ToolExecution {
                    tool: name.to_string(),
                    message: "no live implementation registered".to_string(),
                }),
                attempts: 0,
            };
        };

        let max_attempts = tool.descriptor().max_live_attempts();
        let mut attempts = 0;
        loop {
            attempts += 1;
            let outcome = attempt(live.as_ref(), name.as_str(), params, timeout, cancellation).await;
            match outcome {
                AttemptOutcome::Success(value) => {
                    self.health.record_success(name);
                    return LivePhase {
                        outcome: AttemptOutcome::Success(value),
                        attempts,
                    };
                }
                AttemptOutcome::Failed(error) if error.is_liveness_signal() => {
                    self.health.record_failure(name);
                    let give_up = attempts >= max_attempts
                        || cancellation.is_cancelled()
                        || (tool.mode() == ToolMode::Auto && self.health.is_unhealthy(name));
                    if give_up {
                        return LivePhase {
                            outcome: AttemptOutcome::Failed(error),
                            attempts,
                        };
                    }
                    debug!(tool = %name, attempt = attempts, error = %error, "Retrying live call");
                }
                failed => return LivePhase { outcome: failed, attempts },
            }
        }
    }

    async fn degraded(
        &self,
        tool: &RegisteredTool,
        params: &Value,
        cancellation: &CancellationToken,
        notice: DegradedModeNotice,
    ) -> Invocation {
        let name = tool.name().clone();
        let Some(substitute) = tool.degraded() else {
            return Invocation::failure(
                name.clone(),
                UsedMode::Degraded,
                ToolError::ToolExecution {
                    tool: name.to_string(),
                    message: "no degraded substitute registered".to_string(),
                },
            )
            .with_notice(notice);
        };

        match substitute.invoke(params, cancellation.child_token()).await {
            Ok(value) => Invocation::success(name, UsedMode::Degraded, value).with_notice(notice),
            Err(e) => Invocation::failure(
                name.clone(),
                UsedMode::Degraded,
                e.into_tool_error(name.as_str()),
            )
            .with_notice(notice),
        }
    }

    fn record(&self, invocation: &Invocation) {
        let stats = self.metrics.record(invocation);
        let transitions = self.alerts.evaluate(&invocation.tool_name, &stats);
        self.logger.log_invocation(invocation);
        for event in &transitions {
            self.logger.log_alert(event);
        }

        if invocation.is_success() {
            debug!(
                tool = %invocation.tool_name,
                mode = %invocation.used_mode,
                latency_ms = invocation.latency.as_millis() as u64,
                "Invocation succeeded"
            );
        } else {
            warn!(
                tool = %invocation.tool_name,
                outcome = %invocation.outcome,
                error = %invocation.error_detail().unwrap_or_default(),
                "Invocation failed"
            );
        }
    }
}

/// One live call bounded by `timeout`; the child token is cancelled when the
/// timeout fires so the backend can stop work.
async fn attempt(
    live: &dyn ToolBackend,
    tool: &str,
    params: &Value,
    timeout: Duration,
    cancellation: &CancellationToken,
) -> AttemptOutcome {
    let token = cancellation.child_token();
    match tokio::time::timeout(timeout, live.invoke(params, token.clone())).await {
        Ok(Ok(value)) => AttemptOutcome::Success(value),
        Ok(Err(e)) => AttemptOutcome::Failed(e.into_tool_error(tool)),
        Err(_) => {
            token.cancel();
            AttemptOutcome::Failed(ToolError::Timeout {
                tool: tool.to_string(),
                timeout,
            })
        }
    }
}
