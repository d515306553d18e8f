//! Port for structured invocation logging.
//!
//! This is separate from `tracing`-based operation logs: tracing carries
//! human-readable diagnostics, while this port captures every completed
//! [`Invocation`] in a machine-readable form (JSONL in the infrastructure
//! adapter).

use toolgate_domain::{AlertEvent, Invocation};

/// Port for recording completed invocations and alert transitions.
///
/// Methods are synchronous and non-fallible so a broken log never disturbs
/// dispatch; implementations swallow their own write errors.
pub trait InvocationLogger: Send + Sync {
    fn log_invocation(&self, invocation: &Invocation);

    fn log_alert(&self, _event: &AlertEvent) {}
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoInvocationLogger;

impl InvocationLogger for NoInvocationLogger {
    fn log_invocation(&self, _invocation: &Invocation) {}
}
