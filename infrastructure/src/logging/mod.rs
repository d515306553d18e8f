//! Logging infrastructure: structured invocation logs and alert notification.
//!
//! - [`JsonlInvocationLogger`] implements the
//!   [`InvocationLogger`](toolgate_application::InvocationLogger) port
//! - [`TracingAlertNotifier`] implements the
//!   [`AlertNotifier`](toolgate_application::AlertNotifier) port

mod jsonl_logger;
mod tracing_notifier;

pub use jsonl_logger::JsonlInvocationLogger;
pub use tracing_notifier::TracingAlertNotifier;
