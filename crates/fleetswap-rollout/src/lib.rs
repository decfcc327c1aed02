//! fleetswap-rollout — Blue/Green deployment of a fleet pair.
//!
//! Two scaling groups sit behind one weighted routing rule. Exactly one
//! of them carries traffic at rest; a deployment brings the other one up
//! to the same capacity, waits for it to become healthy, moves traffic
//! over, and relaxes the old fleet.
//!
//! # Components
//!
//! - **`resolver`** — which fleet is idling and which is running
//! - **`traffic`** — weight rewrite and swap (optional 50/50 hold)
//! - **`capacity`** — desired/min/max updates, drain and provisioning waits
//! - **`schedule`** — scheduled action migration between fleets
//! - **`status`** — read-only status view of both fleets
//! - **`orchestrator`** — the deploy / rollback state machine

pub mod capacity;
pub mod error;
pub mod orchestrator;
pub mod resolver;
pub mod schedule;
pub mod status;
pub mod traffic;

pub use capacity::{
    CapacityWait, CleanupOutcome, cleanup_idling_fleet, update_capacity, update_capacity_for_role,
};
pub use error::{DeployError, DeployResult};
pub use fleetswap_health::HealthSnapshot;
pub use orchestrator::{DeployOptions, DeployPhase, Orchestrator};
pub use resolver::{DeployInfo, DeployTarget, SlotWeights, resolve, resolve_weights};
pub use schedule::{MigrationReport, move_scheduled_actions};
pub use status::{FleetStatus, NoopReporter, StatusReporter, StatusView, collect_status};
pub use traffic::{set_weights, swap};
