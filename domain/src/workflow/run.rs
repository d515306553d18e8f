//! Workflow run record.
//!
//! A [`WorkflowRun`] collects what one execution produced: a result per
//! successful step and a [`DegradedStep`] entry for every step that did not
//! complete via its live path (deadline, failure, missing input or
//! substitute result). A run with any degraded step is never reported as
//! complete.

use crate::tool::{DegradedReason, Invocation, InvocationOutcome, ToolName, UsedMode};
use crate::workflow::entities::StepId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Unique identifier of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a step is listed as degraded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StepDegradation {
    /// Not completed when the run deadline passed (abandoned or never started)
    DeadlineExceeded,
    /// The invocation completed with a non-success outcome
    Failed {
        outcome: InvocationOutcome,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    /// A bound input was not available, so the step was not invoked
    MissingInput { source_step: StepId },
    /// The result came from the degraded substitute
    Substituted { cause: DegradedReason },
}

/// A step that did not complete via its live path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedStep {
    pub step_id: StepId,
    pub tool_name: ToolName,
    #[serde(flatten)]
    pub degradation: StepDegradation,
}

/// Result of a successful step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutput {
    pub tool_name: ToolName,
    pub value: Value,
    pub used_mode: UsedMode,
    pub invocation: Invocation,
}

/// One execution of a workflow definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub run_id: RunId,
    pub workflow: String,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub results: BTreeMap<StepId, StepOutput>,
    pub degraded_steps: Vec<DegradedStep>,
}

impl WorkflowRun {
    pub fn start(workflow: impl Into<String>) -> Self {
        Self {
            run_id: RunId::new(),
            workflow: workflow.into(),
            started_at: Utc::now(),
            finished_at: None,
            results: BTreeMap::new(),
            degraded_steps: Vec::new(),
        }
    }

    /// Record a completed invocation for a step.
    ///
    /// Successful invocations land in `results`; a substitute result is also
    /// listed as degraded. Failures are listed as degraded only.
    pub fn record_invocation(&mut self, step_id: StepId, invocation: Invocation) {
        let tool_name = invocation.tool_name.clone();
        let value = match (invocation.outcome, invocation.result.clone()) {
            (InvocationOutcome::Success, Some(value)) => value,
            (outcome, _) => {
                let degradation = StepDegradation::Failed {
                    outcome,
                    detail: invocation.error_detail(),
                };
                self.mark_degraded(step_id, tool_name, degradation);
                return;
            }
        };

        if let Some(notice) = &invocation.degraded_notice {
            self.mark_degraded(
                step_id.clone(),
                tool_name.clone(),
                StepDegradation::Substituted {
                    cause: notice.reason,
                },
            );
        }
        self.results.insert(
            step_id,
            StepOutput {
                tool_name,
                value,
                used_mode: invocation.used_mode,
                invocation,
            },
        );
    }

    pub fn mark_degraded(
        &mut self,
        step_id: StepId,
        tool_name: ToolName,
        degradation: StepDegradation,
    ) {
        self.degraded_steps.push(DegradedStep {
            step_id,
            tool_name,
            degradation,
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn result(&self, step_id: &StepId) -> Option<&StepOutput> {
        self.results.get(step_id)
    }

    pub fn is_degraded(&self, step_id: &StepId) -> bool {
        self.degraded_steps.iter().any(|d| &d.step_id == step_id)
    }

    /// Number of steps that produced a result (live or substitute)
    pub fn succeeded_count(&self) -> usize {
        self.results.len()
    }

    /// True only when every step completed via its live path
    pub fn is_complete(&self) -> bool {
        self.degraded_steps.is_empty()
    }
}
