//! Scheduled capacity action migration between fleets.

use serde::Serialize;
use tracing::{info, warn};

use fleetswap_gateway::CloudGateway;

use crate::error::DeployResult;

/// Outcome of [`move_scheduled_actions`], by action name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub moved: Vec<String>,
    pub failed: Vec<String>,
}

impl MigrationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Copy every scheduled action of `from` onto `to`, deleting each
/// original once its copy exists.
///
/// Actions are moved independently. A failed copy leaves the original in
/// place; a failed delete leaves the action on both fleets. Either is
/// logged and recorded in the report. Only listing `from` is fatal.
pub async fn move_scheduled_actions(
    gateway: &dyn CloudGateway,
    from: &str,
    to: &str,
) -> DeployResult<MigrationReport> {
    let actions = gateway.list_scheduled_actions(from).await?;
    info!(from, to, count = actions.len(), "moving scheduled actions");

    let mut report = MigrationReport::default();
    for action in actions {
        if let Err(e) = gateway.put_scheduled_action(to, &action).await {
            warn!(action = %action.name, from, to, error = %e, "failed to copy scheduled action");
            report.failed.push(action.name);
            continue;
        }
        if let Err(e) = gateway.delete_scheduled_action(from, &action.name).await {
            warn!(action = %action.name, from, error = %e, "copied scheduled action but failed to delete original");
            report.failed.push(action.name);
            continue;
        }
        info!(action = %action.name, from, to, "moved scheduled action");
        report.moved.push(action.name);
    }

    if !report.is_complete() {
        warn!(
            moved = report.moved.len(),
            failed = report.failed.len(),
            "scheduled action migration was partial"
        );
    }
    Ok(report)
}
