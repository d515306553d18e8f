//! Workflow definitions.
//!
//! A [`WorkflowDefinition`] is an ordered list of [`WorkflowStep`]s. Adjacent
//! steps sharing a `parallel_group` form one [`Stage`] and run concurrently;
//! a step without a group is a stage of its own. Stages run strictly in
//! order, so a step can only consume outputs of steps in earlier stages.

use crate::tool::ToolName;
use crate::util::{duration_ms, option_duration_ms};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use thiserror::Error;

/// Default concurrency bound within one parallel group
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Identifier of a step, unique within its workflow
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StepId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Structural problems found before a workflow runs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowValidationError {
    #[error("workflow has no steps")]
    Empty,

    #[error("duplicate step id: {0}")]
    DuplicateStep(StepId),

    #[error("parallel group '{0}' is split by other steps; group members must be adjacent")]
    NonContiguousGroup(String),

    #[error("step '{step}' binds input from '{source_step}', which is not in an earlier stage")]
    ForwardBinding { step: StepId, source_step: StepId },

    #[error("max_concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("deadline must be greater than zero")]
    ZeroDeadline,
}

/// Copies (part of) an earlier step's output into a parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputBinding {
    /// Parameter name to set on this step
    pub target: String,
    /// Step whose output is read
    pub source_step: StepId,
    /// JSON pointer into the source output (`None` = whole output)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
}

impl InputBinding {
    pub fn new(target: impl Into<String>, source_step: impl Into<StepId>) -> Self {
        Self {
            target: target.into(),
            source_step: source_step.into(),
            pointer: None,
        }
    }

    pub fn with_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.pointer = Some(pointer.into());
        self
    }
}

/// A binding that could not be satisfied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingInput {
    pub source_step: StepId,
    pub target: String,
}

/// Static parameters plus bindings to earlier outputs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputMapping {
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub bindings: Vec<InputBinding>,
}

impl InputMapping {
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_binding(mut self, binding: InputBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Build the step's parameter object from the outputs produced so far
    pub fn resolve(&self, outputs: &HashMap<StepId, Value>) -> Result<Value, MissingInput> {
        let mut params = self.params.clone();
        for binding in &self.bindings {
            let missing = || MissingInput {
                source_step: binding.source_step.clone(),
                target: binding.target.clone(),
            };
            let output = outputs.get(&binding.source_step).ok_or_else(missing)?;
            let value = match &binding.pointer {
                Some(pointer) => output.pointer(pointer).ok_or_else(missing)?,
                None => output,
            };
            params.insert(binding.target.clone(), value.clone());
        }
        Ok(Value::Object(params))
    }
}

/// One node of a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub step_id: StepId,
    pub tool_name: ToolName,
    #[serde(default)]
    pub input: InputMapping,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_group: Option<String>,
    /// Overrides the tool's own timeout for this step
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "option_duration_ms",
        rename = "timeout_ms"
    )]
    pub timeout: Option<Duration>,
}

impl WorkflowStep {
    pub fn new(step_id: impl Into<StepId>, tool_name: impl Into<ToolName>) -> Self {
        Self {
            step_id: step_id.into(),
            tool_name: tool_name.into(),
            input: InputMapping::default(),
            parallel_group: None,
            timeout: None,
        }
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.parallel_group = Some(group.into());
        self
    }

    pub fn with_input(mut self, input: InputMapping) -> Self {
        self.input = input;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Steps that run together
#[derive(Debug, Clone, PartialEq)]
pub struct Stage<'a> {
    pub group: Option<&'a str>,
    pub steps: Vec<&'a WorkflowStep>,
}

/// Declarative workflow supplied by the calling layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub name: String,
    pub steps: Vec<WorkflowStep>,
    /// Wall-clock bound for the whole run
    #[serde(with = "duration_ms", rename = "deadline_ms")]
    pub deadline: Duration,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

impl WorkflowDefinition {
    pub fn new(name: impl Into<String>, deadline: Duration) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            deadline,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn step(mut self, step: WorkflowStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Group adjacent steps into execution stages
    pub fn stages(&self) -> Vec<Stage<'_>> {
        let mut stages: Vec<Stage<'_>> = Vec::new();
        for step in &self.steps {
            let group = step.parallel_group.as_deref();
            match (stages.last_mut(), group) {
                (Some(last), Some(g)) if last.group == Some(g) => last.steps.push(step),
                _ => stages.push(Stage {
                    group,
                    steps: vec![step],
                }),
            }
        }
        stages
    }

    /// Check structure: ids, group adjacency, binding order, limits
    pub fn validate(&self) -> Result<(), WorkflowValidationError> {
        if self.steps.is_empty() {
            return Err(WorkflowValidationError::Empty);
        }
        if self.max_concurrency == 0 {
            return Err(WorkflowValidationError::ZeroConcurrency);
        }
        if self.deadline.is_zero() {
            return Err(WorkflowValidationError::ZeroDeadline);
        }

        let mut seen_ids = HashSet::new();
        for step in &self.steps {
            if !seen_ids.insert(&step.step_id) {
                return Err(WorkflowValidationError::DuplicateStep(step.step_id.clone()));
            }
        }

        let mut seen_groups = HashSet::new();
        let mut earlier: HashSet<&StepId> = HashSet::new();
        for stage in self.stages() {
            if let Some(group) = stage.group
                && !seen_groups.insert(group)
            {
                return Err(WorkflowValidationError::NonContiguousGroup(
                    group.to_string(),
                ));
            }
            for step in &stage.steps {
                if let Some(binding) = step
                    .input
                    .bindings
                    .iter()
                    .find(|b| !earlier.contains(&b.source_step))
                {
                    return Err(WorkflowValidationError::ForwardBinding {
                        step: step.step_id.clone(),
                        source_step: binding.source_step.clone(),
                    });
                }
            }
            earlier.extend(stage.steps.iter().map(|s| &s.step_id));
        }

        Ok(())
    }
}
