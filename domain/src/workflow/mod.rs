//! Workflow domain
//!
//! Declarative multi-step tool workflows and the record of their execution.
//! The engine that runs them lives in the application layer.

pub mod entities;
pub mod run;

pub use entities::{
    DEFAULT_MAX_CONCURRENCY, InputBinding, InputMapping, MissingInput, Stage, StepId,
    WorkflowDefinition, WorkflowStep, WorkflowValidationError,
};
pub use run::{DegradedStep, RunId, StepDegradation, StepOutput, WorkflowRun};
