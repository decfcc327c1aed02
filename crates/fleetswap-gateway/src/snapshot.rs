//! Serializable state of the simulated cloud.
//!
//! A [`CloudSnapshot`] is what [`crate::MemoryGateway`] serves and what
//! [`crate::FileGateway`] persists between CLI invocations.

use serde::{Deserialize, Serialize};

use crate::types::*;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudSnapshot {
    #[serde(default)]
    pub rules: Vec<RoutingRule>,
    #[serde(default)]
    pub target_groups: Vec<TargetGroupRecord>,
    #[serde(default)]
    pub fleets: Vec<FleetRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetGroupRecord {
    pub id: String,
    pub name: String,
    pub health: HealthSource,
}

/// Where a simulated target group gets its per-target health from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum HealthSource {
    /// A fixed list of target states.
    Fixed { states: Vec<TargetHealthState> },
    /// One target per instance of the named fleet, derived from its lifecycle state.
    MirrorFleet { fleet_name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetRecord {
    #[serde(flatten)]
    pub fleet: FleetDescription,
    #[serde(default)]
    pub scheduled_actions: Vec<ScheduledAction>,
    #[serde(default)]
    pub convergence: Convergence,
    /// Sequence number used to name launched instances.
    #[serde(default)]
    pub launched: u32,
    /// Describes left before an `AfterPolls` fleet converges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_polls: Option<u32>,
}

/// How a simulated fleet's instance list follows its desired capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Convergence {
    /// Instances match desired capacity as soon as it changes.
    #[default]
    Immediate,
    /// Instances never change on their own.
    Manual,
    /// Instances match desired capacity on the Nth describe after a change.
    AfterPolls { polls: u32 },
}

impl CloudSnapshot {
    pub fn with_rule(mut self, rule: RoutingRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_target_group(mut self, id: &str, name: &str, health: HealthSource) -> Self {
        self.target_groups.push(TargetGroupRecord {
            id: id.to_string(),
            name: name.to_string(),
            health,
        });
        self
    }

    pub fn with_fleet(mut self, fleet: FleetDescription, convergence: Convergence) -> Self {
        let launched = u32::try_from(fleet.instances.len()).unwrap_or(u32::MAX);
        self.fleets.push(FleetRecord {
            fleet,
            scheduled_actions: Vec::new(),
            convergence,
            launched,
            pending_polls: None,
        });
        self
    }

    pub fn with_scheduled_actions(mut self, fleet_name: &str, actions: Vec<ScheduledAction>) -> Self {
        if let Some(record) = self.fleet_mut(fleet_name) {
            record.scheduled_actions = actions;
        }
        self
    }

    /// A ready-to-deploy pair: `green` running one healthy instance at full
    /// weight, `blue` idle and empty. Target health mirrors each fleet.
    pub fn seeded(rule_id: &str, blue: (&str, &str), green: (&str, &str)) -> Self {
        let (blue_fleet, blue_tg) = blue;
        let (green_fleet, green_tg) = green;
        CloudSnapshot::default()
            .with_rule(RoutingRule {
                rule_id: rule_id.to_string(),
                targets: vec![
                    WeightedTarget {
                        target_group_id: blue_tg.to_string(),
                        weight: 0,
                    },
                    WeightedTarget {
                        target_group_id: green_tg.to_string(),
                        weight: 100,
                    },
                ],
                stickiness: None,
            })
            .with_target_group(
                blue_tg,
                blue_fleet,
                HealthSource::MirrorFleet {
                    fleet_name: blue_fleet.to_string(),
                },
            )
            .with_target_group(
                green_tg,
                green_fleet,
                HealthSource::MirrorFleet {
                    fleet_name: green_fleet.to_string(),
                },
            )
            .with_fleet(
                FleetDescription {
                    name: blue_fleet.to_string(),
                    desired: 0,
                    min: 0,
                    max: 2,
                    instances: Vec::new(),
                },
                Convergence::Immediate,
            )
            .with_fleet(
                FleetDescription {
                    name: green_fleet.to_string(),
                    desired: 1,
                    min: 1,
                    max: 2,
                    instances: vec![Instance {
                        id: format!("{green_fleet}-1"),
                        lifecycle_state: LifecycleState::InService,
                    }],
                },
                Convergence::Immediate,
            )
    }

    pub fn rule(&self, rule_id: &str) -> Option<&RoutingRule> {
        self.rules.iter().find(|r| r.rule_id == rule_id)
    }

    pub fn rule_mut(&mut self, rule_id: &str) -> Option<&mut RoutingRule> {
        self.rules.iter_mut().find(|r| r.rule_id == rule_id)
    }

    pub fn target_group(&self, id: &str) -> Option<&TargetGroupRecord> {
        self.target_groups.iter().find(|tg| tg.id == id)
    }

    pub fn target_group_mut(&mut self, id: &str) -> Option<&mut TargetGroupRecord> {
        self.target_groups.iter_mut().find(|tg| tg.id == id)
    }

    pub fn fleet(&self, name: &str) -> Option<&FleetRecord> {
        self.fleets.iter().find(|f| f.fleet.name == name)
    }

    pub fn fleet_mut(&mut self, name: &str) -> Option<&mut FleetRecord> {
        self.fleets.iter_mut().find(|f| f.fleet.name == name)
    }

    /// Current per-target health of a target group.
    pub fn health_of(&self, target_group: &TargetGroupRecord) -> Vec<TargetHealthState> {
        match &target_group.health {
            HealthSource::Fixed { states } => states.clone(),
            HealthSource::MirrorFleet { fleet_name } => self
                .fleet(fleet_name)
                .map(|record| {
                    record
                        .fleet
                        .instances
                        .iter()
                        .map(|i| mirrored_health(i.lifecycle_state))
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

impl FleetRecord {
    /// Launch or terminate instances until the list matches `target`.
    pub fn resize(&mut self, target: u32) {
        let target = target as usize;
        self.fleet.instances.truncate(target);
        while self.fleet.instances.len() < target {
            self.launched += 1;
            self.fleet.instances.push(Instance {
                id: format!("{}-{}", self.fleet.name, self.launched),
                lifecycle_state: LifecycleState::InService,
            });
        }
    }
}

fn mirrored_health(state: LifecycleState) -> TargetHealthState {
    match state {
        LifecycleState::InService => TargetHealthState::Healthy,
        LifecycleState::Pending => TargetHealthState::Initial,
        LifecycleState::Terminating => TargetHealthState::Draining,
        LifecycleState::Standby | LifecycleState::Terminated | LifecycleState::Unknown => {
            TargetHealthState::Unused
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_cloud_is_green_running() {
        let cloud = CloudSnapshot::seeded("rule", ("blue", "tg-blue"), ("green", "tg-green"));
        let rule = cloud.rule("rule").unwrap();
        assert_eq!(rule.weight_of("tg-blue"), Some(0));
        assert_eq!(rule.weight_of("tg-green"), Some(100));

        let green_tg = cloud.target_group("tg-green").unwrap();
        assert_eq!(cloud.health_of(green_tg), vec![TargetHealthState::Healthy]);
        let blue_tg = cloud.target_group("tg-blue").unwrap();
        assert!(cloud.health_of(blue_tg).is_empty());
    }

    #[test]
    fn resize_names_new_instances_sequentially() {
        let mut cloud = CloudSnapshot::seeded("rule", ("blue", "tg-blue"), ("green", "tg-green"));
        let green = cloud.fleet_mut("green").unwrap();
        green.resize(3);
        let ids: Vec<_> = green.fleet.instances.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["green-1", "green-2", "green-3"]);

        green.resize(1);
        assert_eq!(green.fleet.instances.len(), 1);
        green.resize(2);
        assert_eq!(green.fleet.instances[1].id, "green-4");
    }

    #[test]
    fn snapshot_json_roundtrip() {
        let cloud = CloudSnapshot::seeded("rule", ("blue", "tg-blue"), ("green", "tg-green"));
        let json = serde_json::to_string_pretty(&cloud).unwrap();
        assert!(json.contains("\"source\": \"mirror_fleet\""));
        let back: CloudSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cloud);
    }
}
