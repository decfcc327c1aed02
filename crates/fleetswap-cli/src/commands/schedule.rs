use fleetswap_rollout::Orchestrator;

use super::fleet_name;
use crate::output::{print_success, print_warning};

pub async fn move_scheduled_actions(
    orchestrator: &Orchestrator,
    from: &str,
    to: &str,
) -> anyhow::Result<()> {
    let from = fleet_name(orchestrator.settings(), from);
    let to = fleet_name(orchestrator.settings(), to);
    let report = orchestrator.move_scheduled_actions(&from, &to).await?;

    let label = |fleet: &str| match orchestrator.settings().fleets.role_of_fleet(fleet) {
        Some(role) => format!("{fleet} ({role})"),
        None => fleet.to_string(),
    };
    for name in &report.moved {
        print_success(&format!("moved {name}: {} → {}", label(&from), label(&to)));
    }
    for name in &report.failed {
        print_warning(&format!("could not move {name}, see log for details"));
    }
    Ok(())
}
