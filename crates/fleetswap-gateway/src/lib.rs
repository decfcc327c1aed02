//! fleetswap-gateway — the cloud capability surface the deployer drives.
//!
//! The deployer never talks to a provider SDK directly. Everything it
//! needs (routing rule weights, target health, fleet capacity, scheduled
//! capacity actions) goes through the [`CloudGateway`] trait.
//!
//! # Adapters
//!
//! ```text
//! CloudGateway
//!   ├── MemoryGateway  in-process simulated cloud (tests, dry runs)
//!   │     ├── fault injection per operation / resource key
//!   │     └── fleet convergence: immediate | manual | after N polls
//!   └── FileGateway    MemoryGateway persisted to a JSON CloudSnapshot
//! ```
//!
//! All wire types are plain serde values so a snapshot of the simulated
//! cloud can be written to and read from disk.

pub mod error;
pub mod file;
pub mod gateway;
pub mod memory;
pub mod snapshot;
pub mod types;

pub use error::{GatewayError, GatewayResult, ResourceKind};
pub use file::FileGateway;
pub use gateway::CloudGateway;
pub use memory::{GatewayOp, MemoryGateway};
pub use snapshot::{CloudSnapshot, Convergence, FleetRecord, HealthSource, TargetGroupRecord};
pub use types::*;
