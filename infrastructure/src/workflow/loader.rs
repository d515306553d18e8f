//! Reads workflow definitions from TOML or JSON files
//!
//! ```toml
//! name = "trip-briefing"
//! deadline_ms = 10000
//! max_concurrency = 4
//!
//! [[steps]]
//! step_id = "geo"
//! tool_name = "geocode"
//! input.params = { city = "Oslo" }
//!
//! [[steps]]
//! step_id = "weather"
//! tool_name = "weather"
//! parallel_group = "lookups"
//! input.bindings = [{ target = "coords", source_step = "geo", pointer = "/location" }]
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;
use toolgate_domain::{WorkflowDefinition, WorkflowValidationError};

#[derive(Error, Debug)]
pub enum WorkflowFileError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse workflow TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse workflow JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid workflow: {0}")]
    Invalid(#[from] WorkflowValidationError),
}

pub struct WorkflowLoader;

impl WorkflowLoader {
    /// Load and validate a definition; `.json` files are parsed as JSON,
    /// everything else as TOML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<WorkflowDefinition, WorkflowFileError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| WorkflowFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    pub fn from_toml_str(content: &str) -> Result<WorkflowDefinition, WorkflowFileError> {
        let definition: WorkflowDefinition = toml::from_str(content)?;
        definition.validate()?;
        Ok(definition)
    }

    pub fn from_json_str(content: &str) -> Result<WorkflowDefinition, WorkflowFileError> {
        let definition: WorkflowDefinition = serde_json::from_str(content)?;
        definition.validate()?;
        Ok(definition)
    }
}
