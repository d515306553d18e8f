//! Tool backend adapters
//!
//! Concrete implementations of the
//! [`ToolBackend`](toolgate_application::ToolBackend) port, plus the factory
//! that builds them from `[tools.*]` config sections.
//!
//! | Kind | Adapter | Typical role |
//! |------|---------|--------------|
//! | `http` | [`HttpToolBackend`] (feature `web-tools`) | live |
//! | `command` | [`CommandToolBackend`] | live |
//! | `canned` | [`CannedToolBackend`] | degraded |

pub mod canned;
pub mod command;
#[cfg(feature = "web-tools")]
pub mod http;

mod factory;

pub use canned::CannedToolBackend;
pub use command::CommandToolBackend;
pub use factory::{BackendBuildError, BackendFactory, RegistrationReport};
#[cfg(feature = "web-tools")]
pub use http::HttpToolBackend;
