//! Workflow definition files

mod loader;

pub use loader::{WorkflowFileError, WorkflowLoader};
