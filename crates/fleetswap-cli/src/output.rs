//! Terminal output: status table, markers, confirmation prompt.

use colored::Colorize;
use tabled::{Table, Tabled};

use fleetswap_rollout::{FleetStatus, StatusReporter, StatusView};

/// Output format for `status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Tabled)]
struct StatusRow {
    #[tabled(rename = "target")]
    role: String,
    #[tabled(rename = "traffic(%)")]
    traffic: String,
    #[tabled(rename = "fleet")]
    fleet_name: String,
    desired: u32,
    min: u32,
    max: u32,
    lifecycle: String,
    #[tabled(rename = "target group")]
    target_group: String,
    total: usize,
    healthy: usize,
    unhealthy: usize,
    unused: usize,
    initial: usize,
    draining: usize,
}

impl From<&FleetStatus> for StatusRow {
    fn from(f: &FleetStatus) -> Self {
        Self {
            role: f.role.to_string(),
            traffic: f.weight.map_or_else(|| "-".to_string(), |w| w.to_string()),
            fleet_name: f.fleet_name.clone(),
            desired: f.desired,
            min: f.min,
            max: f.max,
            lifecycle: f.lifecycle.clone(),
            target_group: f.target_group_name.clone(),
            total: f.health.total,
            healthy: f.health.healthy,
            unhealthy: f.health.unhealthy,
            unused: f.health.unused,
            initial: f.health.initial,
            draining: f.health.draining,
        }
    }
}

pub fn status_table(view: &StatusView) -> String {
    Table::new(view.fleets.iter().map(StatusRow::from)).to_string()
}

pub fn print_status(view: &StatusView, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => println!("{}", status_table(view)),
        OutputFormat::Json => println!("{}", view.to_json_pretty()?),
    }
    Ok(())
}

/// Prints every status view a workflow produces as a table.
#[derive(Debug, Default)]
pub struct TableReporter;

impl StatusReporter for TableReporter {
    fn report(&self, view: &StatusView) {
        println!("{}", status_table(view));
    }
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

pub fn print_command_succeeded() {
    println!("{}", "🎉 Command Succeeded".green().bold());
}

pub fn print_command_failure(error: &anyhow::Error) {
    eprintln!("{} {error:#}", "🚨 Command Failure:".red().bold());
}

/// Ask before a traffic-moving command; `assume_yes` skips the prompt.
pub fn confirm(prompt: &str, assume_yes: bool) -> bool {
    if assume_yes {
        return true;
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use fleetswap_core::FleetRole;
    use fleetswap_gateway::TargetHealthState;
    use fleetswap_rollout::{FleetStatus, HealthSnapshot};

    use super::*;

    fn view() -> StatusView {
        StatusView {
            listener_rule_id: "rule/app".into(),
            fleets: vec![FleetStatus {
                role: FleetRole::Blue,
                weight: None,
                fleet_name: "app-blue".into(),
                desired: 2,
                min: 1,
                max: 4,
                lifecycle: "InService:2".into(),
                target_group_id: "tg/app-blue".into(),
                target_group_name: "app-blue-tg".into(),
                health: HealthSnapshot::tally(&[
                    TargetHealthState::Healthy,
                    TargetHealthState::Draining,
                ]),
            }],
        }
    }

    #[test]
    fn table_has_a_row_per_fleet() {
        let table = status_table(&view());
        assert!(table.contains("traffic(%)"));
        assert!(table.contains("app-blue-tg"));
        assert!(table.contains("InService:2"));
    }

    #[test]
    fn missing_weight_renders_as_dash() {
        let row = StatusRow::from(&view().fleets[0]);
        assert_eq!(row.traffic, "-");
        assert_eq!((row.healthy, row.draining), (1, 1));
    }

    #[test]
    fn assume_yes_skips_prompt() {
        assert!(confirm("Deploy?", true));
    }
}
