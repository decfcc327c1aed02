//! Wire types exchanged with the cloud gateway.
//!
//! These mirror the provider's shapes closely enough to be filled in by
//! an SDK adapter, while staying plain serde values so the simulated
//! cloud can be snapshotted to JSON.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ── Routing rule ───────────────────────────────────────────────────

/// One forward target of a weighted routing rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedTarget {
    pub target_group_id: String,
    /// Relative weight, 0–100.
    pub weight: u32,
}

/// Target-group stickiness attached to a forward action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stickiness {
    pub enabled: bool,
    pub duration_secs: u32,
}

/// Forward configuration of a listener rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRule {
    pub rule_id: String,
    pub targets: Vec<WeightedTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stickiness: Option<Stickiness>,
}

impl RoutingRule {
    /// Weight currently assigned to `target_group_id`, if it is a target.
    pub fn weight_of(&self, target_group_id: &str) -> Option<u32> {
        self.targets
            .iter()
            .find(|t| t.target_group_id == target_group_id)
            .map(|t| t.weight)
    }
}

// ── Target health ──────────────────────────────────────────────────

/// Raw health state of one registered target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetHealthState {
    Healthy,
    Unhealthy,
    Unused,
    Initial,
    Draining,
}

/// Descriptive information about a target group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetGroupInfo {
    pub id: String,
    pub name: String,
}

// ── Fleet ─────────────────────────────────────────────────────────

/// Lifecycle state of an instance inside a scaling group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LifecycleState {
    Pending,
    InService,
    Standby,
    Terminating,
    Terminated,
    #[serde(other)]
    Unknown,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Pending => "Pending",
            LifecycleState::InService => "InService",
            LifecycleState::Standby => "Standby",
            LifecycleState::Terminating => "Terminating",
            LifecycleState::Terminated => "Terminated",
            LifecycleState::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    pub lifecycle_state: LifecycleState,
}

/// Point-in-time view of a scaling group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetDescription {
    pub name: String,
    pub desired: u32,
    pub min: u32,
    pub max: u32,
    #[serde(default)]
    pub instances: Vec<Instance>,
}

impl FleetDescription {
    /// Instance count per lifecycle state, in a stable order.
    pub fn lifecycle_histogram(&self) -> BTreeMap<LifecycleState, usize> {
        let mut histogram = BTreeMap::new();
        for instance in &self.instances {
            *histogram.entry(instance.lifecycle_state).or_insert(0) += 1;
        }
        histogram
    }

    /// `InService:2,Pending:1` style summary; empty when there are no instances.
    pub fn lifecycle_summary(&self) -> String {
        self.lifecycle_histogram()
            .iter()
            .map(|(state, count)| format!("{state}:{count}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// A partial capacity change. `None` leaves the field untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityUpdate {
    pub desired: Option<u32>,
    pub min: Option<u32>,
    pub max: Option<u32>,
}

impl CapacityUpdate {
    /// Build from raw signed inputs; a negative value means "no change".
    pub fn from_signed(desired: Option<i64>, min: Option<i64>, max: Option<i64>) -> Self {
        fn keep(v: Option<i64>) -> Option<u32> {
            v.filter(|n| *n >= 0)
                .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        }
        Self {
            desired: keep(desired),
            min: keep(min),
            max: keep(max),
        }
    }

    /// Match another fleet's desired/min/max exactly.
    pub fn matching(fleet: &FleetDescription) -> Self {
        Self {
            desired: Some(fleet.desired),
            min: Some(fleet.min),
            max: Some(fleet.max),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.desired.is_none() && self.min.is_none() && self.max.is_none()
    }

    /// The capacity `fleet` would have after this update.
    pub fn applied_to(&self, fleet: &FleetDescription) -> (u32, u32, u32) {
        (
            self.desired.unwrap_or(fleet.desired),
            self.min.unwrap_or(fleet.min),
            self.max.unwrap_or(fleet.max),
        )
    }
}

impl fmt::Display for CapacityUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn field(v: Option<u32>) -> String {
            v.map_or_else(|| "-".to_string(), |n| n.to_string())
        }
        write!(
            f,
            "desired:{}, min:{}, max:{}",
            field(self.desired),
            field(self.min),
            field(self.max)
        )
    }
}

// ── Scheduled actions ─────────────────────────────────────────────

/// A scheduled capacity change attached to a fleet.
///
/// Times are carried as the provider's ISO-8601 strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledAction {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl ScheduledAction {
    /// An action with only a name; fill the rest with struct update syntax.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            desired: None,
            min: None,
            max: None,
            recurrence: None,
            start_time: None,
            end_time: None,
            time: None,
            time_zone: None,
        }
    }
}
