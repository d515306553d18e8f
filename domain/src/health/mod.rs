//! Connection health domain
//!
//! Hysteresis-based liveness tracking for live backends. See
//! [`connection::ConnectionHealth`] for the state machine.

pub mod connection;

pub use connection::{ConnectionHealth, HealthPolicy, HealthState, HealthTransition};
