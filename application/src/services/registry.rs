//! Tool registry
//!
//! Maps tool names to their descriptor and implementations. Registration is
//! allowed at any time; the map is read-mostly and cloned out as `Arc`s so no
//! lock is held while a tool runs.

use crate::ports::config_source::ConfigSource;
use crate::ports::tool_backend::{ToolBackend, ToolImplementations};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use toolgate_domain::{ToolDescriptor, ToolError, ToolMode, ToolName};
use tracing::{debug, warn};

/// A tool as held by the registry
#[derive(Debug)]
pub struct RegisteredTool {
    descriptor: ToolDescriptor,
    implementations: ToolImplementations,
    missing_config: Vec<String>,
}

impl RegisteredTool {
    pub fn name(&self) -> &ToolName {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    pub fn mode(&self) -> ToolMode {
        self.descriptor.mode
    }

    pub fn live(&self) -> Option<&Arc<dyn ToolBackend>> {
        self.implementations.live.as_ref()
    }

    pub fn degraded(&self) -> Option<&Arc<dyn ToolBackend>> {
        self.implementations.degraded.as_ref()
    }

    /// Required configuration keys that were unset at registration
    pub fn missing_config(&self) -> &[String] {
        &self.missing_config
    }

    /// False when required configuration is missing; the live path is then
    /// short-circuited with a config error.
    pub fn is_available(&self) -> bool {
        self.missing_config.is_empty()
    }

    /// Whether the live backend may be called
    pub fn live_usable(&self) -> bool {
        self.mode().uses_live() && self.is_available() && self.live().is_some()
    }

    /// Whether a call can produce a result under the current mode
    pub fn is_usable(&self) -> bool {
        match self.mode() {
            ToolMode::Live => self.live_usable(),
            ToolMode::Degraded => self.degraded().is_some(),
            // Unavailable auto tools are short-circuited, so the substitute
            // is not reachable either.
            ToolMode::Auto => self.live_usable(),
        }
    }
}

/// Registry of every tool known to the orchestrator
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<ToolName, Arc<RegisteredTool>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    ///
    /// Duplicates and descriptors that lack the implementation their mode
    /// needs are rejected. Missing configuration still registers the tool,
    /// marked unavailable, and is reported as `ToolError::Configuration`.
    pub fn register(
        &self,
        descriptor: ToolDescriptor,
        implementations: ToolImplementations,
        config: &dyn ConfigSource,
    ) -> Result<(), ToolError> {
        validate_descriptor(&descriptor, &implementations)?;

        let missing_config: Vec<String> = descriptor
            .required_config_keys
            .iter()
            .filter(|key| !config.contains(key))
            .cloned()
            .collect();

        let name = descriptor.name().clone();
        {
            let mut tools = self.tools.write().unwrap_or_else(PoisonError::into_inner);
            if tools.contains_key(&name) {
                return Err(ToolError::DuplicateTool(name.to_string()));
            }
            debug!(
                tool = %name,
                mode = %descriptor.mode,
                live = ?implementations.live.as_ref().map(|b| b.label()),
                degraded = ?implementations.degraded.as_ref().map(|b| b.label()),
                "Registered tool"
            );
            tools.insert(
                name.clone(),
                Arc::new(RegisteredTool {
                    descriptor,
                    implementations,
                    missing_config: missing_config.clone(),
                }),
            );
        }

        if missing_config.is_empty() {
            Ok(())
        } else {
            warn!(tool = %name, missing = ?missing_config, "Tool registered without required configuration");
            Err(ToolError::Configuration {
                tool: name.to_string(),
                message: format!("missing required config: {}", missing_config.join(", ")),
            })
        }
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<RegisteredTool>, ToolError> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Names of tools that can produce a result under their mode, sorted
    pub fn available_tools(&self) -> Vec<ToolName> {
        let mut names: Vec<ToolName> = self
            .tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|tool| tool.is_usable())
            .map(|tool| tool.name().clone())
            .collect();
        names.sort();
        names
    }

    /// Every registered tool, sorted by name
    pub fn tools(&self) -> Vec<Arc<RegisteredTool>> {
        let mut tools: Vec<Arc<RegisteredTool>> = self
            .tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools()
            .iter()
            .map(|tool| tool.descriptor().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn validate_descriptor(
    descriptor: &ToolDescriptor,
    implementations: &ToolImplementations,
) -> Result<(), ToolError> {
    let invalid = |message: &str| ToolError::InvalidDescriptor {
        tool: descriptor.name().to_string(),
        message: message.to_string(),
    };

    if descriptor.name().as_str().trim().is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if descriptor.timeout.is_zero() {
        return Err(invalid("timeout must be greater than zero"));
    }
    if descriptor.mode.uses_live() && implementations.live.is_none() {
        return Err(invalid(&format!(
            "{} mode requires a live implementation",
            descriptor.mode
        )));
    }
    if descriptor.mode == ToolMode::Degraded && implementations.degraded.is_none() {
        return Err(invalid("degraded mode requires a degraded implementation"));
    }
    Ok(())
}
