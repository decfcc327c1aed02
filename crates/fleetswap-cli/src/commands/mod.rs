pub mod capacity;
pub mod deploy;
pub mod init;
pub mod schedule;
pub mod status;
pub mod traffic;

use std::time::Duration;

use fleetswap_core::{DeploySettings, FleetRole, parse_duration};

/// clap value parser for `--hold`.
pub fn parse_hold(s: &str) -> Result<Duration, String> {
    parse_duration(s).map_err(|e| e.to_string())
}

/// `blue` / `green` name a configured slot; anything else is taken as a
/// raw fleet name.
pub fn fleet_name(settings: &DeploySettings, arg: &str) -> String {
    match arg.parse::<FleetRole>() {
        Ok(role) => settings.fleets.slot(role).fleet_name.clone(),
        Err(_) => arg.to_string(),
    }
}
