use std::path::Path;

use anyhow::{Context, bail};

use fleetswap_core::{FleetSlot, FleetswapConfig};

use crate::output::print_success;

pub struct InitArgs {
    pub listener_rule_id: String,
    pub blue_fleet: String,
    pub blue_target_group: String,
    pub green_fleet: String,
    pub green_target_group: String,
    pub force: bool,
}

/// Write a scaffold configuration to `path`.
pub fn init(path: &Path, args: InitArgs) -> anyhow::Result<()> {
    if path.exists() && !args.force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let config = FleetswapConfig::scaffold(
        &args.listener_rule_id,
        FleetSlot {
            fleet_name: args.blue_fleet,
            target_group_id: args.blue_target_group,
        },
        FleetSlot {
            fleet_name: args.green_fleet,
            target_group_id: args.green_target_group,
        },
    );
    config.validate()?;

    let toml = config.to_toml_string()?;
    std::fs::write(path, toml).with_context(|| format!("writing {}", path.display()))?;
    print_success(&format!("Generated {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(force: bool) -> InitArgs {
        InitArgs {
            listener_rule_id: "rule/app".into(),
            blue_fleet: "app-blue".into(),
            blue_target_group: "tg/app-blue".into(),
            green_fleet: "app-green".into(),
            green_target_group: "tg/app-green".into(),
            force,
        }
    }

    #[test]
    fn scaffold_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleetswap.toml");
        init(&path, args(false)).unwrap();

        let config = FleetswapConfig::from_file(&path).unwrap();
        assert_eq!(config.listener_rule_id, "rule/app");
        assert_eq!(config.fleets.green.fleet_name, "app-green");
        assert_eq!(config.retry_policy.max_attempts, 120);
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleetswap.toml");
        std::fs::write(&path, "# mine").unwrap();

        assert!(init(&path, args(false)).is_err());
        init(&path, args(true)).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("listener_rule_id"));
    }

    #[test]
    fn rejects_identical_fleets() {
        let dir = tempfile::tempdir().unwrap();
        let mut same = args(false);
        same.green_fleet = same.blue_fleet.clone();
        assert!(init(&dir.path().join("fleetswap.toml"), same).is_err());
    }
}
