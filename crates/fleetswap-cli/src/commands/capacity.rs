use fleetswap_core::FleetRole;
use fleetswap_gateway::CapacityUpdate;
use fleetswap_rollout::{CapacityWait, CleanupOutcome, Orchestrator};

use crate::output::print_success;

pub async fn set_capacity(
    orchestrator: &Orchestrator,
    role: FleetRole,
    update: CapacityUpdate,
    wait: CapacityWait,
) -> anyhow::Result<()> {
    orchestrator.set_capacity(role, update, wait).await?;
    print_success(&format!("{role} fleet updated ({update})"));
    Ok(())
}

pub async fn cleanup_idle(orchestrator: &Orchestrator) -> anyhow::Result<()> {
    match orchestrator.cleanup_idle().await? {
        CleanupOutcome::Skipped => print_success("idling fleet already empty, nothing to clean up"),
        CleanupOutcome::Done => print_success("idling fleet drained"),
    }
    Ok(())
}
