//! Core domain concepts shared across all subdomains.
//!
//! - [`error::ToolError`]: the error taxonomy of the orchestration layer

pub mod error;
