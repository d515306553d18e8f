use super::file_config::ConfigIssue;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to load config: {0}")]
    Load(Box<figment::Error>),

    #[error("invalid config ({} error(s)): {}", .0.len(), summarize(.0))]
    Invalid(Vec<ConfigIssue>),
}

fn summarize(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
