//! Capacity controller: fleet desired/min/max changes and the waits that
//! follow them.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info};

use fleetswap_core::{Attempt, DeploySettings, FleetRole, RetryError, RetryPolicy, poll};
use fleetswap_gateway::{CapacityUpdate, CloudGateway, GatewayError};

use crate::error::{DeployError, DeployResult};
use crate::resolver::resolve;

/// What to wait for after a capacity change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CapacityWait {
    /// Return as soon as the update is accepted.
    #[default]
    None,
    /// Poll until the fleet has no instances left.
    Drain,
    /// Poll until the fleet has at least one instance.
    Provisioned,
}

impl CapacityWait {
    fn as_str(self) -> &'static str {
        match self {
            CapacityWait::None => "none",
            CapacityWait::Drain => "drain",
            CapacityWait::Provisioned => "provisioned",
        }
    }
}

impl fmt::Display for CapacityWait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapacityWait {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(CapacityWait::None),
            "drain" => Ok(CapacityWait::Drain),
            "provisioned" => Ok(CapacityWait::Provisioned),
            other => Err(format!(
                "unknown wait mode {other:?}, expected none, drain or provisioned"
            )),
        }
    }
}

/// Result of [`cleanup_idling_fleet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// The idling fleet had no instances; nothing was changed.
    Skipped,
    /// The idling fleet was scaled to zero and drained.
    Done,
}

/// Apply `update` to `fleet_name`, then wait as requested.
pub async fn update_capacity(
    gateway: &dyn CloudGateway,
    policy: &RetryPolicy,
    fleet_name: &str,
    update: CapacityUpdate,
    wait: CapacityWait,
) -> DeployResult<()> {
    if update.is_empty() {
        debug!(fleet = fleet_name, "no capacity fields to change");
    } else {
        gateway.update_fleet(fleet_name, &update).await?;
        info!(fleet = fleet_name, %update, "fleet capacity updated");
    }

    match wait {
        CapacityWait::None => Ok(()),
        CapacityWait::Drain | CapacityWait::Provisioned => {
            wait_for_instances(gateway, policy, fleet_name, wait).await
        }
    }
}

/// [`update_capacity`] addressed by slot instead of fleet name.
pub async fn update_capacity_for_role(
    gateway: &dyn CloudGateway,
    settings: &DeploySettings,
    role: FleetRole,
    update: CapacityUpdate,
    wait: CapacityWait,
) -> DeployResult<()> {
    let fleet_name = &settings.fleets.slot(role).fleet_name;
    update_capacity(gateway, &settings.retry_policy, fleet_name, update, wait).await
}

/// Scale the idling fleet to zero and wait for it to drain.
pub async fn cleanup_idling_fleet(
    gateway: &dyn CloudGateway,
    settings: &DeploySettings,
) -> DeployResult<CleanupOutcome> {
    let info = resolve(gateway, settings).await?;
    let idling = &info.idling.fleet;
    if idling.instances.is_empty() {
        info!(fleet = %idling.name, role = %info.idling.role, "idling fleet is empty, skipping cleanup");
        return Ok(CleanupOutcome::Skipped);
    }

    info!(
        fleet = %idling.name,
        role = %info.idling.role,
        instances = idling.instances.len(),
        "cleaning up idling fleet"
    );
    update_capacity(
        gateway,
        &settings.retry_policy,
        &idling.name,
        teardown(),
        CapacityWait::Drain,
    )
    .await?;
    Ok(CleanupOutcome::Done)
}

/// desired=0, min=0; max untouched.
pub(crate) fn teardown() -> CapacityUpdate {
    CapacityUpdate {
        desired: Some(0),
        min: Some(0),
        max: None,
    }
}

async fn wait_for_instances(
    gateway: &dyn CloudGateway,
    policy: &RetryPolicy,
    fleet_name: &str,
    wait: CapacityWait,
) -> DeployResult<()> {
    let result = poll(policy, move |attempt| async move {
        let fleet = gateway.describe_fleet(fleet_name).await?;
        info!(
            fleet = fleet_name,
            attempt = attempt + 1,
            instances = fleet.instances.len(),
            lifecycle = %fleet.lifecycle_summary(),
            wait = %wait,
            "waiting for fleet"
        );
        let reached = match wait {
            CapacityWait::Drain => fleet.instances.is_empty(),
            CapacityWait::Provisioned => !fleet.instances.is_empty(),
            CapacityWait::None => true,
        };
        Ok::<_, GatewayError>(if reached {
            Attempt::Done(())
        } else {
            Attempt::Retry
        })
    })
    .await;

    match result {
        Ok(()) => Ok(()),
        Err(RetryError::Exhausted { attempts }) => Err(DeployError::RetryTimeout {
            operation: format!("{wait} of fleet {fleet_name}"),
            attempts,
        }),
        Err(RetryError::Aborted(e)) => Err(e.into()),
    }
}
