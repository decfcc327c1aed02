//! fleetswap.toml configuration parser.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::duration::parse_duration;
use crate::error::{ConfigError, ConfigResult};
use crate::types::{FleetRole, FleetSlot, RetryPolicy};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetswapConfig {
    /// The listener rule whose forward action splits traffic between the fleets.
    pub listener_rule_id: String,
    pub fleets: FleetSlots,
    #[serde(default)]
    pub retry_policy: RetryPolicyConfig,
    #[serde(default)]
    pub deploy: DeployConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSlots {
    pub blue: FleetSlot,
    pub green: FleetSlot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicyConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// How long to hold a 50/50 split before completing a swap ("0s" disables it).
    #[serde(default = "default_swap_hold")]
    pub swap_hold: String,
    /// Wall-clock ceiling for a whole CLI command.
    #[serde(default = "default_command_timeout")]
    pub command_timeout: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub kind: GatewayKind,
    /// Snapshot file for the `file` gateway.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayKind {
    /// Ephemeral in-process cloud; state is lost on exit.
    #[default]
    Memory,
    /// Simulated cloud persisted to a JSON snapshot.
    File,
}

/// Validated settings with every duration resolved, passed explicitly to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploySettings {
    pub listener_rule_id: String,
    pub fleets: FleetSlots,
    pub retry_policy: RetryPolicy,
    pub swap_hold: Duration,
    pub command_timeout: Duration,
}

fn default_max_attempts() -> u32 {
    120
}

fn default_interval_secs() -> u64 {
    10
}

fn default_swap_hold() -> String {
    "0s".to_string()
}

fn default_command_timeout() -> String {
    "60m".to_string()
}

impl Default for RetryPolicyConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            swap_hold: default_swap_hold(),
            command_timeout: default_command_timeout(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            kind: GatewayKind::Memory,
            path: None,
        }
    }
}

impl FleetSlots {
    pub fn slot(&self, role: FleetRole) -> &FleetSlot {
        match role {
            FleetRole::Blue => &self.blue,
            FleetRole::Green => &self.green,
        }
    }

    /// Which slot registers into `target_group_id`, if any.
    pub fn role_of_target_group(&self, target_group_id: &str) -> Option<FleetRole> {
        FleetRole::ALL
            .into_iter()
            .find(|role| self.slot(*role).target_group_id == target_group_id)
    }

    /// Which slot owns the scaling group `fleet_name`, if any.
    pub fn role_of_fleet(&self, fleet_name: &str) -> Option<FleetRole> {
        FleetRole::ALL
            .into_iter()
            .find(|role| self.slot(*role).fleet_name == fleet_name)
    }
}

impl FleetswapConfig {
    /// Load a config file. `.json` files are parsed as JSON, anything else as TOML.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: display.clone(),
            message: e.to_string(),
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config: FleetswapConfig = if is_json {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: display,
                message: e.to_string(),
            })?
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: display,
                message: e.to_string(),
            })?
        };

        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Reject configurations that would make blue/green identity ambiguous.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.listener_rule_id.trim().is_empty() {
            return Err(ConfigError::Invalid("listener_rule_id is empty".into()));
        }
        for role in FleetRole::ALL {
            let slot = self.fleets.slot(role);
            if slot.fleet_name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("fleets.{role}.fleet_name is empty")));
            }
            if slot.target_group_id.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "fleets.{role}.target_group_id is empty"
                )));
            }
        }
        if self.fleets.blue.fleet_name == self.fleets.green.fleet_name {
            return Err(ConfigError::Invalid(
                "blue and green must use different fleets".into(),
            ));
        }
        if self.fleets.blue.target_group_id == self.fleets.green.target_group_id {
            return Err(ConfigError::Invalid(
                "blue and green must use different target groups".into(),
            ));
        }
        if self.retry_policy.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry_policy.max_attempts must be at least 1".into(),
            ));
        }
        if self.gateway.kind == GatewayKind::File && self.gateway.path.is_none() {
            return Err(ConfigError::Invalid(
                "gateway.path is required for the file gateway".into(),
            ));
        }
        self.settings().map(|_| ())
    }

    /// Resolve durations and the retry policy once, at load time.
    pub fn settings(&self) -> ConfigResult<DeploySettings> {
        Ok(DeploySettings {
            listener_rule_id: self.listener_rule_id.clone(),
            fleets: self.fleets.clone(),
            retry_policy: RetryPolicy::new(
                self.retry_policy.max_attempts,
                Duration::from_secs(self.retry_policy.interval_secs),
            ),
            swap_hold: parse_duration(&self.deploy.swap_hold)?,
            command_timeout: parse_duration(&self.deploy.command_timeout)?,
        })
    }

    /// Scaffold a config for the given fleet and target group names.
    pub fn scaffold(listener_rule_id: &str, blue: FleetSlot, green: FleetSlot) -> Self {
        Self {
            listener_rule_id: listener_rule_id.to_string(),
            fleets: FleetSlots { blue, green },
            retry_policy: RetryPolicyConfig::default(),
            deploy: DeployConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}
