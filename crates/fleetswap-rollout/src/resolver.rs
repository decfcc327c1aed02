//! Deployment state resolution.
//!
//! Reads the routing rule and both fleets and decides which slot is
//! idling (weight 0) and which is running (weight > 0). Read-only.

use serde::Serialize;
use tracing::{debug, warn};

use fleetswap_core::{DeploySettings, FleetRole};
use fleetswap_gateway::{CloudGateway, FleetDescription, RoutingRule};

use crate::error::{DeployError, DeployResult};

/// Current routing weight of each configured slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotWeights {
    pub blue: u32,
    pub green: u32,
}

impl SlotWeights {
    pub fn of(&self, role: FleetRole) -> u32 {
        match role {
            FleetRole::Blue => self.blue,
            FleetRole::Green => self.green,
        }
    }

    /// The slot carrying no traffic, if exactly one does.
    pub fn idling_role(&self) -> DeployResult<FleetRole> {
        match (self.blue, self.green) {
            (0, g) if g > 0 => Ok(FleetRole::Blue),
            (b, 0) if b > 0 => Ok(FleetRole::Green),
            (blue, green) => Err(DeployError::AmbiguousTrafficSplit { blue, green }),
        }
    }

    pub fn swapped(&self) -> Self {
        Self {
            blue: self.green,
            green: self.blue,
        }
    }
}

/// One side of a resolved deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployTarget {
    pub role: FleetRole,
    pub weight: u32,
    pub fleet: FleetDescription,
    pub target_group_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployInfo {
    pub idling: DeployTarget,
    pub running: DeployTarget,
}

/// Weight of each configured target group in `rule`.
pub fn slot_weights(rule: &RoutingRule, settings: &DeploySettings) -> DeployResult<SlotWeights> {
    let weight = |role: FleetRole| {
        let target_group_id = &settings.fleets.slot(role).target_group_id;
        rule.weight_of(target_group_id)
            .ok_or_else(|| DeployError::MissingTarget {
                role,
                target_group_id: target_group_id.clone(),
            })
    };
    let weights = SlotWeights {
        blue: weight(FleetRole::Blue)?,
        green: weight(FleetRole::Green)?,
    };

    for target in &rule.targets {
        if settings
            .fleets
            .role_of_target_group(&target.target_group_id)
            .is_none()
        {
            warn!(
                rule = %rule.rule_id,
                target_group = %target.target_group_id,
                weight = target.weight,
                "routing rule has a target outside the configured fleets"
            );
        }
    }
    Ok(weights)
}

/// Read the routing rule and return the weight of each slot.
pub async fn resolve_weights(
    gateway: &dyn CloudGateway,
    settings: &DeploySettings,
) -> DeployResult<SlotWeights> {
    let rule = gateway
        .describe_routing_rule(&settings.listener_rule_id)
        .await?;
    slot_weights(&rule, settings)
}

/// Resolve which fleet is idling and which is running.
pub async fn resolve(
    gateway: &dyn CloudGateway,
    settings: &DeploySettings,
) -> DeployResult<DeployInfo> {
    let weights = resolve_weights(gateway, settings).await?;
    let idling_role = weights.idling_role()?;

    let target = move |role: FleetRole| async move {
        let slot = settings.fleets.slot(role);
        let fleet = gateway.describe_fleet(&slot.fleet_name).await?;
        Ok::<_, DeployError>(DeployTarget {
            role,
            weight: weights.of(role),
            fleet,
            target_group_id: slot.target_group_id.clone(),
        })
    };
    let idling = target(idling_role).await?;
    let running = target(idling_role.counterpart()).await?;

    debug!(
        idling = %idling.role,
        idling_fleet = %idling.fleet.name,
        running = %running.role,
        running_fleet = %running.fleet.name,
        running_weight = running.weight,
        "resolved deployment state"
    );
    Ok(DeployInfo { idling, running })
}

impl DeployInfo {
    pub fn target(&self, role: FleetRole) -> &DeployTarget {
        if self.idling.role == role {
            &self.idling
        } else {
            &self.running
        }
    }
}

#[cfg(test)]
mod tests {
    use fleetswap_core::{FleetSlot, FleetSlots, RetryPolicy};
    use fleetswap_gateway::WeightedTarget;
    use std::time::Duration;

    use super::*;

    fn settings() -> DeploySettings {
        DeploySettings {
            listener_rule_id: "rule".into(),
            fleets: FleetSlots {
                blue: FleetSlot {
                    fleet_name: "app-blue".into(),
                    target_group_id: "tg-blue".into(),
                },
                green: FleetSlot {
                    fleet_name: "app-green".into(),
                    target_group_id: "tg-green".into(),
                },
            },
            retry_policy: RetryPolicy::default(),
            swap_hold: Duration::ZERO,
            command_timeout: Duration::from_secs(3600),
        }
    }

    fn rule(targets: &[(&str, u32)]) -> RoutingRule {
        RoutingRule {
            rule_id: "rule".into(),
            targets: targets
                .iter()
                .map(|(tg, weight)| WeightedTarget {
                    target_group_id: tg.to_string(),
                    weight: *weight,
                })
                .collect(),
            stickiness: None,
        }
    }

    #[test]
    fn exactly_one_zero_weight_resolves() {
        for (blue, green, expected) in [
            (0, 100, Some(FleetRole::Blue)),
            (100, 0, Some(FleetRole::Green)),
            (0, 1, Some(FleetRole::Blue)),
            (0, 0, None),
            (50, 50, None),
            (1, 99, None),
        ] {
            let weights = SlotWeights { blue, green };
            match expected {
                Some(role) => assert_eq!(weights.idling_role().unwrap(), role),
                None => assert!(matches!(
                    weights.idling_role(),
                    Err(DeployError::AmbiguousTrafficSplit { .. })
                )),
            }
        }
    }

    #[test]
    fn weights_follow_configured_target_groups() {
        // Target order in the rule does not matter.
        let weights = slot_weights(&rule(&[("tg-green", 100), ("tg-blue", 0)]), &settings()).unwrap();
        assert_eq!(weights, SlotWeights { blue: 0, green: 100 });
        assert_eq!(weights.swapped(), SlotWeights { blue: 100, green: 0 });
    }

    #[test]
    fn missing_configured_target_is_an_error() {
        let err = slot_weights(&rule(&[("tg-blue", 0), ("tg-other", 100)]), &settings()).unwrap_err();
        assert!(matches!(
            err,
            DeployError::MissingTarget { role: FleetRole::Green, .. }
        ));
    }

    #[test]
    fn extra_targets_are_tolerated() {
        let weights = slot_weights(
            &rule(&[("tg-blue", 0), ("tg-green", 100), ("tg-legacy", 0)]),
            &settings(),
        )
        .unwrap();
        assert_eq!(weights.idling_role().unwrap(), FleetRole::Blue);
    }
}
