use std::time::Duration;

use anyhow::bail;
use tracing::info;

use fleetswap_rollout::{DeployOptions, Orchestrator, StatusView};

use crate::output::confirm;

pub struct DeployArgs {
    pub swap: bool,
    pub cleanup_before: bool,
    pub cleanup_after: bool,
    pub hold: Option<Duration>,
}

pub async fn deploy(orchestrator: &mut Orchestrator, args: DeployArgs) -> anyhow::Result<()> {
    let options = DeployOptions {
        swap: args.swap,
        cleanup_before: args.cleanup_before,
        cleanup_after: args.cleanup_after,
        swap_hold: args.hold.unwrap_or(orchestrator.settings().swap_hold),
    };

    info!(?options, "deploying");
    orchestrator.deploy(options).await?;
    Ok(())
}

pub async fn rollback(orchestrator: &mut Orchestrator) -> anyhow::Result<()> {
    orchestrator.rollback().await?;
    Ok(())
}

/// Ask the operator before a traffic-moving command, quoting the current
/// split. The full table is printed by the workflow itself once it starts.
pub async fn confirm_traffic_change(
    orchestrator: &Orchestrator,
    action: &str,
) -> anyhow::Result<()> {
    let view = orchestrator.status().await?;
    let prompt = format!("{action}? (traffic {})", traffic_summary(&view));
    if !confirm(&prompt, false) {
        bail!("{action}: aborted by operator");
    }
    Ok(())
}

fn traffic_summary(view: &StatusView) -> String {
    view.fleets
        .iter()
        .map(|f| match f.weight {
            Some(w) => format!("{} {}:{w}", f.fleet_name, f.role),
            None => format!("{} {}:-", f.fleet_name, f.role),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
