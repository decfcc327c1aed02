use std::time::Duration;

use fleetswap_rollout::Orchestrator;

use crate::output::print_success;

pub async fn swap(orchestrator: &Orchestrator, hold: Option<Duration>) -> anyhow::Result<()> {
    let hold = hold.unwrap_or(orchestrator.settings().swap_hold);
    let weights = orchestrator.swap(hold).await?;
    print_success(&format!(
        "traffic now blue:{} green:{}",
        weights.blue, weights.green
    ));
    Ok(())
}
