//! Alert notification port
//!
//! Receives every alert transition (fired or resolved) as it happens.
//! Delivery to external channels is an adapter concern.

use toolgate_domain::AlertEvent;

/// Callback for alert transitions
pub trait AlertNotifier: Send + Sync {
    fn notify(&self, event: &AlertEvent);
}

/// No-op notifier for when nobody is listening
pub struct NoAlertNotifier;

impl AlertNotifier for NoAlertNotifier {
    fn notify(&self, _event: &AlertEvent) {}
}
