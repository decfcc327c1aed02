//! fleetswap-health — target health tallies and the health gate.
//!
//! The gate is what decides whether a freshly provisioned fleet may take
//! traffic. It re-reads target health on every attempt and never caches
//! a tally across attempts.
//!
//! # Architecture
//!
//! ```text
//! await_healthy(target_group, desired)
//!   └── fleetswap_core::poll(RetryPolicy)
//!         ├── CloudGateway::describe_target_health()
//!         ├── HealthSnapshot::tally() → counts
//!         └── healthy >= desired ? Done : Retry
//! ```
//!
//! A gateway error aborts the gate immediately. Running out of attempts
//! yields [`HealthGateError::Timeout`], which the orchestrator treats as
//! the signal to roll back.

pub mod gate;
pub mod snapshot;

pub use gate::{HealthGateError, HealthGateResult, await_healthy};
pub use snapshot::HealthSnapshot;
