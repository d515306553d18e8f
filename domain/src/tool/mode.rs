//! Tool mode definitions.
//!
//! [`ToolMode`] is the per-tool routing policy: it decides whether a call may
//! touch the live backend, the degraded substitute, or both.
//! [`UsedMode`] records which of the two actually produced an invocation's
//! outcome.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Routing policy for a tool.
///
/// - **Live**: always the real backend; failures surface to the caller.
/// - **Degraded**: always the local substitute; the backend is never contacted.
/// - **Auto** (hybrid): the real backend while it is believed healthy, the
///   substitute when it is known unhealthy or when a live attempt fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolMode {
    Live,
    Degraded,
    #[default]
    Auto,
}

impl ToolMode {
    /// Whether calls in this mode may reach the live backend
    pub fn uses_live(&self) -> bool {
        matches!(self, ToolMode::Live | ToolMode::Auto)
    }

    /// Whether calls in this mode may reach the degraded substitute
    pub fn uses_degraded(&self) -> bool {
        matches!(self, ToolMode::Degraded | ToolMode::Auto)
    }

    /// Whether the prober should ping tools in this mode
    pub fn is_probed(&self) -> bool {
        self.uses_live()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolMode::Live => "live",
            ToolMode::Degraded => "degraded",
            ToolMode::Auto => "auto",
        }
    }
}

impl fmt::Display for ToolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ToolMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "live" | "real" => Ok(ToolMode::Live),
            "degraded" | "mock" | "fallback" => Ok(ToolMode::Degraded),
            "auto" | "hybrid" => Ok(ToolMode::Auto),
            _ => Err(format!("Invalid ToolMode: {}", s)),
        }
    }
}

/// The implementation that produced an invocation's final outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsedMode {
    Live,
    Degraded,
}

impl UsedMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsedMode::Live => "live",
            UsedMode::Degraded => "degraded",
        }
    }
}

impl fmt::Display for UsedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
