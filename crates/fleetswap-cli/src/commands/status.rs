use fleetswap_rollout::Orchestrator;

use crate::output::{OutputFormat, print_status};

pub async fn status(orchestrator: &Orchestrator, format: OutputFormat) -> anyhow::Result<()> {
    let view = orchestrator.status().await?;
    print_status(&view, format)
}
