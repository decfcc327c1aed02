//! Read-only status view of both fleets.

use serde::Serialize;
use tracing::debug;

use fleetswap_core::{DeploySettings, FleetRole};
use fleetswap_gateway::{CloudGateway, FleetDescription, TargetHealthState};
use fleetswap_health::HealthSnapshot;

use crate::error::DeployResult;

/// One row of the status table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FleetStatus {
    pub role: FleetRole,
    /// Routing weight; `None` when the target group is not in the rule.
    pub weight: Option<u32>,
    pub fleet_name: String,
    pub desired: u32,
    pub min: u32,
    pub max: u32,
    pub lifecycle: String,
    pub target_group_id: String,
    pub target_group_name: String,
    pub health: HealthSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub listener_rule_id: String,
    pub fleets: Vec<FleetStatus>,
}

impl StatusView {
    pub fn fleet(&self, role: FleetRole) -> Option<&FleetStatus> {
        self.fleets.iter().find(|f| f.role == role)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Sink for status views produced while a workflow runs.
pub trait StatusReporter: Send + Sync {
    fn report(&self, view: &StatusView);
}

/// Discards every view.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl StatusReporter for NoopReporter {
    fn report(&self, _view: &StatusView) {}
}

/// Gather weights, capacity and health of both fleets.
///
/// Does not require a valid traffic split, so it can show an ambiguous
/// state. Health and target group reads for both fleets run
/// concurrently; any failure fails the whole view.
pub async fn collect_status(
    gateway: &dyn CloudGateway,
    settings: &DeploySettings,
) -> DeployResult<StatusView> {
    let rule = gateway
        .describe_routing_rule(&settings.listener_rule_id)
        .await?;
    let blue = &settings.fleets.blue;
    let green = &settings.fleets.green;

    let (blue_fleet, green_fleet, blue_health, green_health, blue_tg, green_tg) = tokio::try_join!(
        gateway.describe_fleet(&blue.fleet_name),
        gateway.describe_fleet(&green.fleet_name),
        gateway.describe_target_health(&blue.target_group_id),
        gateway.describe_target_health(&green.target_group_id),
        gateway.describe_target_group(&blue.target_group_id),
        gateway.describe_target_group(&green.target_group_id),
    )?;

    let row = |role: FleetRole,
               fleet: FleetDescription,
               health: Vec<TargetHealthState>,
               tg_name: String| {
        let target_group_id = settings.fleets.slot(role).target_group_id.clone();
        FleetStatus {
            role,
            weight: rule.weight_of(&target_group_id),
            lifecycle: fleet.lifecycle_summary(),
            fleet_name: fleet.name,
            desired: fleet.desired,
            min: fleet.min,
            max: fleet.max,
            target_group_id,
            target_group_name: tg_name,
            health: HealthSnapshot::tally(&health),
        }
    };

    let view = StatusView {
        listener_rule_id: rule.rule_id.clone(),
        fleets: vec![
            row(FleetRole::Blue, blue_fleet, blue_health, blue_tg.name),
            row(FleetRole::Green, green_fleet, green_health, green_tg.name),
        ],
    };
    debug!(rule = %view.listener_rule_id, "collected status");
    Ok(view)
}
