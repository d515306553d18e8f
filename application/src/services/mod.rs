//! Stateful services shared by the use cases
//!
//! Each service keeps per-tool state behind its own lock; none of them holds
//! a lock across an `.await`.

pub mod alert_manager;
pub mod health_tracker;
pub mod metrics_store;
pub mod prober;
pub mod registry;
