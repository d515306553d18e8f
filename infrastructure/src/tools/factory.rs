//! Builds backends from `[tools.*]` config and registers them

use super::canned::CannedToolBackend;
use super::command::CommandToolBackend;
use crate::config::{BackendKind, FileBackendConfig, FileConfig};
use std::sync::Arc;
use thiserror::Error;
use toolgate_application::{ConfigSource, Orchestrator, ToolBackend, ToolImplementations};
use toolgate_domain::ToolError;
use tracing::{info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendBuildError {
    #[error("{field}: {message}")]
    Invalid { field: String, message: String },

    #[error("{field}: http backends require the web-tools feature")]
    HttpUnsupported { field: String },
}

/// Outcome of registering every configured tool
#[derive(Debug, Default)]
pub struct RegistrationReport {
    /// Registered and usable
    pub registered: Vec<String>,
    /// Registered, but missing required config keys
    pub unavailable: Vec<(String, ToolError)>,
    /// Not registered at all
    pub rejected: Vec<(String, String)>,
}

impl RegistrationReport {
    pub fn is_clean(&self) -> bool {
        self.unavailable.is_empty() && self.rejected.is_empty()
    }
}

/// Creates backends; holds the HTTP client shared by every http backend
#[derive(Debug, Clone)]
pub struct BackendFactory {
    #[cfg(feature = "web-tools")]
    client: reqwest::Client,
}

impl BackendFactory {
    #[cfg(feature = "web-tools")]
    pub fn new() -> Result<Self, BackendBuildError> {
        let client = super::http::build_client().map_err(|e| BackendBuildError::Invalid {
            field: "http".to_string(),
            message: format!("failed to create HTTP client: {}", e),
        })?;
        Ok(Self { client })
    }

    #[cfg(not(feature = "web-tools"))]
    pub fn new() -> Result<Self, BackendBuildError> {
        Ok(Self {})
    }

    /// Build one backend; `field` names it in errors (e.g. `tools.search.live`)
    pub fn build(
        &self,
        field: &str,
        config: &FileBackendConfig,
        source: &dyn ConfigSource,
    ) -> Result<Arc<dyn ToolBackend>, BackendBuildError> {
        let invalid = |message: String| BackendBuildError::Invalid {
            field: field.to_string(),
            message,
        };
        let kind = config.parse_kind().map_err(invalid)?;

        match kind {
            BackendKind::Canned => Ok(Arc::new(CannedToolBackend::new(
                config.response.clone().unwrap_or_default(),
            ))),
            BackendKind::Command => {
                let program = config
                    .command
                    .as_deref()
                    .filter(|c| !c.trim().is_empty())
                    .ok_or_else(|| invalid("command backends need a command".to_string()))?;
                let mut backend = CommandToolBackend::new(program).with_args(config.args.clone());
                if let Some(dir) = &config.working_dir {
                    backend = backend.with_working_dir(dir);
                }
                Ok(Arc::new(backend))
            }
            BackendKind::Http => self.build_http(field, config, source),
        }
    }

    #[cfg(feature = "web-tools")]
    fn build_http(
        &self,
        field: &str,
        config: &FileBackendConfig,
        source: &dyn ConfigSource,
    ) -> Result<Arc<dyn ToolBackend>, BackendBuildError> {
        use super::http::HttpToolBackend;

        let url = config
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| BackendBuildError::Invalid {
                field: field.to_string(),
                message: "http backends need a url".to_string(),
            })?;
        let mut backend = HttpToolBackend::new(self.client.clone(), url);
        if let Some(health_url) = &config.health_url {
            backend = backend.with_health_url(health_url);
        }
        // A missing key is reported by the registry as a configuration error
        if let Some(key) = &config.auth_key
            && let Some(token) = source.get(key)
        {
            backend = backend.with_bearer_token(token);
        }
        Ok(Arc::new(backend))
    }

    #[cfg(not(feature = "web-tools"))]
    fn build_http(
        &self,
        field: &str,
        _config: &FileBackendConfig,
        _source: &dyn ConfigSource,
    ) -> Result<Arc<dyn ToolBackend>, BackendBuildError> {
        Err(BackendBuildError::HttpUnsupported {
            field: field.to_string(),
        })
    }

    /// Register every `[tools.*]` entry with the orchestrator.
    ///
    /// A tool whose backends cannot be built is skipped; the rest still register.
    pub fn register_tools(
        &self,
        orchestrator: &Orchestrator,
        config: &FileConfig,
        source: &dyn ConfigSource,
    ) -> RegistrationReport {
        let default_mode = config.default_mode();
        let mut report = RegistrationReport::default();

        for (name, tool) in &config.tools {
            let mut descriptor = tool.to_descriptor(name, default_mode);
            if let Some(auth_key) = tool.live.as_ref().and_then(|l| l.auth_key.as_ref())
                && !descriptor.required_config_keys.contains(auth_key)
            {
                descriptor = descriptor.with_required_key(auth_key.clone());
            }

            let implementations = match self.implementations(name, tool, source) {
                Ok(implementations) => implementations,
                Err(e) => {
                    warn!(tool = %name, error = %e, "Skipping tool");
                    report.rejected.push((name.clone(), e.to_string()));
                    continue;
                }
            };

            match orchestrator.register(descriptor, implementations, source) {
                Ok(()) => report.registered.push(name.clone()),
                Err(e) if e.is_configuration() => {
                    warn!(tool = %name, error = %e, "Tool registered but unavailable");
                    report.unavailable.push((name.clone(), e));
                }
                Err(e) => {
                    warn!(tool = %name, error = %e, "Skipping tool");
                    report.rejected.push((name.clone(), e.to_string()));
                }
            }
        }

        info!(
            registered = report.registered.len(),
            unavailable = report.unavailable.len(),
            rejected = report.rejected.len(),
            "Tool registration complete"
        );
        report
    }

    fn implementations(
        &self,
        name: &str,
        tool: &crate::config::FileToolConfig,
        source: &dyn ConfigSource,
    ) -> Result<ToolImplementations, BackendBuildError> {
        let mut implementations = ToolImplementations::new();
        if let Some(live) = &tool.live {
            implementations =
                implementations.with_live(self.build(&format!("tools.{}.live", name), live, source)?);
        }
        if let Some(degraded) = &tool.degraded {
            implementations = implementations.with_degraded(self.build(
                &format!("tools.{}.degraded", name),
                degraded,
                source,
            )?);
        }
        Ok(implementations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use toolgate_application::{EmptyConfigSource, OrchestratorConfig};
    use toolgate_domain::{ToolMode, UsedMode};

    fn orchestrator() -> Orchestrator {
        Orchestrator::builder(OrchestratorConfig::default().without_probing()).build()
    }

    fn config(toml_str: &str) -> FileConfig {
        toml::from_str(toml_str).unwrap()
    }

    #[tokio::test]
    async fn test_register_canned_tool_and_invoke() {
        let config = config(
            r#"
[tools.weather]
mode = "degraded"

[tools.weather.degraded]
kind = "canned"
response = { conditions = "unknown" }
"#,
        );
        let orchestrator = orchestrator();
        let report = BackendFactory::new()
            .unwrap()
            .register_tools(&orchestrator, &config, &EmptyConfigSource);
        assert_eq!(report.registered, vec!["weather"]);
        assert!(report.is_clean());

        let invocation = orchestrator
            .invoke("weather", json!({"city": "Oslo"}), None)
            .await
            .unwrap();
        assert_eq!(invocation.used_mode, UsedMode::Degraded);
        assert_eq!(invocation.result, Some(json!({"conditions": "unknown"})));
    }

    #[test]
    fn test_missing_required_key_leaves_tool_unavailable() {
        let config = config(
            r#"
[tools.search]
mode = "auto"
required_keys = ["SEARCH_API_KEY"]

[tools.search.live]
kind = "command"
command = "search-cli"

[tools.search.degraded]
kind = "canned"
"#,
        );
        let orchestrator = orchestrator();
        let factory = BackendFactory::new().unwrap();

        let report = factory.register_tools(&orchestrator, &config, &EmptyConfigSource);
        assert!(report.registered.is_empty());
        assert_eq!(report.unavailable[0].0, "search");
        assert!(orchestrator.registry().contains("search"));
        assert!(orchestrator.registry().available_tools().is_empty());

        let with_key: HashMap<String, String> =
            HashMap::from([("SEARCH_API_KEY".to_string(), "k".to_string())]);
        let fresh = self::orchestrator();
        let report = factory.register_tools(&fresh, &config, &with_key);
        assert_eq!(report.registered, vec!["search"]);
        assert_eq!(
            fresh.registry().lookup("search").unwrap().mode(),
            ToolMode::Auto
        );
    }

    #[test]
    fn test_unbuildable_tool_is_rejected_others_register() {
        let config = config(
            r#"
[tools.broken]
mode = "live"
[tools.broken.live]
kind = "command"

[tools.echo]
mode = "degraded"
[tools.echo.degraded]
kind = "canned"
"#,
        );
        let orchestrator = orchestrator();
        let report = BackendFactory::new()
            .unwrap()
            .register_tools(&orchestrator, &config, &EmptyConfigSource);
        assert_eq!(report.registered, vec!["echo"]);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].0, "broken");
        assert!(report.rejected[0].1.contains("tools.broken.live"));
    }

    #[test]
    fn test_mode_without_matching_backend_is_rejected() {
        let config = config(
            r#"
[tools.calc]
mode = "live"
[tools.calc.degraded]
kind = "canned"
"#,
        );
        let orchestrator = orchestrator();
        let report = BackendFactory::new()
            .unwrap()
            .register_tools(&orchestrator, &config, &EmptyConfigSource);
        assert_eq!(report.rejected[0].0, "calc");
        assert!(!orchestrator.registry().contains("calc"));
    }

    #[cfg(not(feature = "web-tools"))]
    #[test]
    fn test_http_requires_feature() {
        let backend = FileBackendConfig {
            kind: "http".to_string(),
            url: Some("http://localhost:9".to_string()),
            ..Default::default()
        };
        let err = BackendFactory::new()
            .unwrap()
            .build("tools.x.live", &backend, &EmptyConfigSource)
            .err()
            .unwrap();
        assert!(matches!(err, BackendBuildError::HttpUnsupported { .. }));
    }
}
