//! Run Workflow use case
//!
//! Executes a [`WorkflowDefinition`] stage by stage. Steps of one parallel
//! group run concurrently on a `JoinSet`, bounded by a semaphore; stages run
//! strictly in order. The whole run shares one deadline: when it passes the
//! run token is cancelled, in-flight tasks are aborted and every unfinished
//! step is recorded as degraded. The engine never waits past the deadline.

use crate::services::registry::ToolRegistry;
use crate::use_cases::dispatch::Dispatcher;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use toolgate_domain::{
    Invocation, InvocationOutcome, StepDegradation, StepId, ToolError, ToolName, WorkflowDefinition,
    WorkflowRun, WorkflowStep, WorkflowValidationError,
};
use tracing::{debug, info, warn};

/// Errors that stop a workflow from producing a usable run
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Invalid workflow: {0}")]
    Invalid(#[from] WorkflowValidationError),

    #[error("Step '{step}' uses unavailable tool '{tool}'")]
    UnavailableTool { step: StepId, tool: ToolName },

    /// No step produced a result; the run is attached for inspection
    #[error("All steps of workflow '{}' failed", .0.workflow)]
    AllStepsFailed(Box<WorkflowRun>),
}

impl WorkflowError {
    /// The run record, when execution got that far
    pub fn run(&self) -> Option<&WorkflowRun> {
        match self {
            WorkflowError::AllStepsFailed(run) => Some(run),
            _ => None,
        }
    }
}

type StepResult = (StepId, ToolName, Result<Invocation, ToolError>);

/// Use case for running a workflow
pub struct WorkflowEngine {
    dispatcher: Arc<Dispatcher>,
    registry: Arc<ToolRegistry>,
}

impl WorkflowEngine {
    pub fn new(dispatcher: Arc<Dispatcher>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            dispatcher,
            registry,
        }
    }

    /// Check a definition against its structure and the registered tools
    pub fn validate(&self, definition: &WorkflowDefinition) -> Result<(), WorkflowError> {
        definition.validate()?;
        let available: HashSet<ToolName> = self.registry.available_tools().into_iter().collect();
        if let Some(step) = definition
            .steps
            .iter()
            .find(|s| !available.contains(&s.tool_name))
        {
            return Err(WorkflowError::UnavailableTool {
                step: step.step_id.clone(),
                tool: step.tool_name.clone(),
            });
        }
        Ok(())
    }

    pub async fn run(&self, definition: &WorkflowDefinition) -> Result<WorkflowRun, WorkflowError> {
        self.validate(definition)?;

        let deadline = Instant::now() + definition.deadline;
        let run_token = CancellationToken::new();
        let semaphore = Arc::new(Semaphore::new(definition.max_concurrency));
        let mut run = WorkflowRun::start(&definition.name);
        let mut outputs: HashMap<StepId, Value> = HashMap::new();

        info!(
            workflow = %definition.name,
            run_id = %run.run_id,
            steps = definition.steps.len(),
            deadline_ms = definition.deadline.as_millis() as u64,
            "Starting workflow"
        );

        let stages = definition.stages();
        let mut expired = false;
        for stage in &stages {
            if expired || Instant::now() >= deadline {
                expired = true;
                for step in &stage.steps {
                    run.mark_degraded(
                        step.step_id.clone(),
                        step.tool_name.clone(),
                        StepDegradation::DeadlineExceeded,
                    );
                }
                continue;
            }

            debug!(group = ?stage.group, steps = stage.steps.len(), "Starting stage");
            let mut join_set: JoinSet<StepResult> = JoinSet::new();
            let mut pending: HashMap<StepId, ToolName> = HashMap::new();
            let mut tasks: HashMap<task::Id, StepId> = HashMap::new();

            for step in &stage.steps {
                let params = match step.input.resolve(&outputs) {
                    Ok(params) => params,
                    Err(missing) => {
                        debug!(step = %step.step_id, source = %missing.source_step, "Input unavailable");
                        run.mark_degraded(
                            step.step_id.clone(),
                            step.tool_name.clone(),
                            StepDegradation::MissingInput {
                                source_step: missing.source_step,
                            },
                        );
                        continue;
                    }
                };

                pending.insert(step.step_id.clone(), step.tool_name.clone());
                let handle = join_set.spawn(self.step_task(step, params, &semaphore, &run_token));
                tasks.insert(handle.id(), step.step_id.clone());
            }

            loop {
                match tokio::time::timeout_at(deadline, join_set.join_next()).await {
                    Ok(Some(Ok((step_id, tool_name, result)))) => {
                        pending.remove(&step_id);
                        match result {
                            Ok(invocation) => {
                                if invocation.is_success()
                                    && let Some(value) = &invocation.result
                                {
                                    outputs.insert(step_id.clone(), value.clone());
                                }
                                run.record_invocation(step_id, invocation);
                            }
                            Err(e) => run.mark_degraded(
                                step_id,
                                tool_name,
                                StepDegradation::Failed {
                                    outcome: InvocationOutcome::Error,
                                    detail: Some(e.to_string()),
                                },
                            ),
                        }
                    }
                    Ok(Some(Err(e))) => {
                        warn!("Step task join error: {}", e);
                        if let Some(step_id) = tasks.remove(&e.id())
                            && let Some(tool_name) = pending.remove(&step_id)
                        {
                            run.mark_degraded(
                                step_id,
                                tool_name,
                                StepDegradation::Failed {
                                    outcome: InvocationOutcome::Error,
                                    detail: Some(format!("step task failed: {}", e)),
                                },
                            );
                        }
                    }
                    Ok(None) => break,
                    Err(_) => {
                        warn!(
                            workflow = %definition.name,
                            unfinished = pending.len(),
                            "Workflow deadline exceeded"
                        );
                        run_token.cancel();
                        join_set.abort_all();
                        expired = true;
                        break;
                    }
                }
            }

            let degradation = if expired {
                StepDegradation::DeadlineExceeded
            } else {
                StepDegradation::Failed {
                    outcome: InvocationOutcome::Error,
                    detail: Some("step task terminated unexpectedly".to_string()),
                }
            };
            // Keep declaration order for the leftovers
            for step in &stage.steps {
                if let Some(tool_name) = pending.remove(&step.step_id) {
                    run.mark_degraded(step.step_id.clone(), tool_name, degradation.clone());
                }
            }
        }

        run.finish();
        info!(
            workflow = %definition.name,
            run_id = %run.run_id,
            succeeded = run.succeeded_count(),
            degraded = run.degraded_steps.len(),
            "Workflow finished"
        );

        if run.succeeded_count() == 0 {
            return Err(WorkflowError::AllStepsFailed(Box::new(run)));
        }
        Ok(run)
    }

    fn step_task(
        &self,
        step: &WorkflowStep,
        params: Value,
        semaphore: &Arc<Semaphore>,
        run_token: &CancellationToken,
    ) -> impl Future<Output = StepResult> + Send + 'static {
        let dispatcher = Arc::clone(&self.dispatcher);
        let semaphore = Arc::clone(semaphore);
        let token = run_token.child_token();
        let step_id = step.step_id.clone();
        let tool_name = step.tool_name.clone();
        let timeout = step.timeout;

        async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => {
                    dispatcher
                        .invoke_with_cancellation(tool_name.as_str(), params, timeout, token)
                        .await
                }
                Err(_) => Err(ToolError::ToolExecution {
                    tool: tool_name.to_string(),
                    message: "workflow cancelled before the step started".to_string(),
                }),
            };
            (step_id, tool_name, result)
        }
    }
}
