//! In-process simulated cloud.
//!
//! Serves a [`CloudSnapshot`] behind a mutex. Used by the test suites
//! and as the backing store of [`crate::FileGateway`]. Faults can be
//! injected per operation (optionally narrowed to one resource key) to
//! exercise partial-failure paths.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{GatewayError, GatewayResult, ResourceKind};
use crate::gateway::CloudGateway;
use crate::snapshot::{CloudSnapshot, Convergence, HealthSource};
use crate::types::*;

/// Gateway operations, for fault injection and call accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    DescribeRoutingRule,
    SetRoutingRule,
    DescribeTargetHealth,
    DescribeTargetGroup,
    DescribeFleet,
    UpdateFleet,
    ListScheduledActions,
    PutScheduledAction,
    DeleteScheduledAction,
}

impl fmt::Display for GatewayOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug)]
struct Fault {
    op: GatewayOp,
    /// Resource key the fault is limited to; `None` matches every call.
    key: Option<String>,
    message: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    cloud: CloudSnapshot,
    faults: Vec<Fault>,
    calls: HashMap<GatewayOp, u32>,
    /// Every accepted routing write, oldest first.
    routing_writes: Vec<RoutingRule>,
}

impl MemoryState {
    /// Count the call and fail it if a matching fault is armed.
    fn enter(&mut self, op: GatewayOp, key: &str) -> GatewayResult<()> {
        *self.calls.entry(op).or_insert(0) += 1;
        if let Some(fault) = self
            .faults
            .iter()
            .find(|f| f.op == op && f.key.as_deref().is_none_or(|k| k == key))
        {
            debug!(%op, key, "injected fault");
            return Err(GatewayError::Transport(fault.message.clone()));
        }
        Ok(())
    }
}

/// Thread-safe in-memory cloud. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryGateway {
    pub fn new(cloud: CloudSnapshot) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                cloud,
                ..Default::default()
            })),
        }
    }

    /// Copy of the current simulated cloud.
    pub async fn snapshot(&self) -> CloudSnapshot {
        self.state.lock().await.cloud.clone()
    }

    /// Make every future `op` call (for `key`, or any key) fail with a transport error.
    ///
    /// Keys are the rule id, target group id, or fleet name the call targets;
    /// scheduled action puts and deletes are keyed by action name.
    pub async fn fail(&self, op: GatewayOp, key: Option<&str>, message: &str) {
        self.state.lock().await.faults.push(Fault {
            op,
            key: key.map(str::to_string),
            message: message.to_string(),
        });
    }

    pub async fn clear_faults(&self) {
        self.state.lock().await.faults.clear();
    }

    /// How many times `op` has been invoked, including failed calls.
    pub async fn calls(&self, op: GatewayOp) -> u32 {
        self.state.lock().await.calls.get(&op).copied().unwrap_or(0)
    }

    /// Fleet state without counting as a describe (no convergence tick).
    pub async fn fleet(&self, name: &str) -> Option<FleetDescription> {
        self.state
            .lock()
            .await
            .cloud
            .fleet(name)
            .map(|r| r.fleet.clone())
    }

    pub async fn weight(&self, rule_id: &str, target_group_id: &str) -> Option<u32> {
        self.state
            .lock()
            .await
            .cloud
            .rule(rule_id)
            .and_then(|r| r.weight_of(target_group_id))
    }

    /// Target lists written to `rule_id`, oldest first.
    pub async fn routing_history(&self, rule_id: &str) -> Vec<Vec<WeightedTarget>> {
        self.state
            .lock()
            .await
            .routing_writes
            .iter()
            .filter(|r| r.rule_id == rule_id)
            .map(|r| r.targets.clone())
            .collect()
    }

    pub async fn scheduled_action_names(&self, fleet_name: &str) -> Vec<String> {
        self.state
            .lock()
            .await
            .cloud
            .fleet(fleet_name)
            .map(|r| r.scheduled_actions.iter().map(|a| a.name.clone()).collect())
            .unwrap_or_default()
    }

    pub async fn set_target_health(&self, target_group_id: &str, health: HealthSource) {
        if let Some(tg) = self.state.lock().await.cloud.target_group_mut(target_group_id) {
            tg.health = health;
        }
    }

    pub async fn set_instances(&self, fleet_name: &str, instances: Vec<Instance>) {
        if let Some(record) = self.state.lock().await.cloud.fleet_mut(fleet_name) {
            record.fleet.instances = instances;
        }
    }

    pub async fn set_convergence(&self, fleet_name: &str, convergence: Convergence) {
        if let Some(record) = self.state.lock().await.cloud.fleet_mut(fleet_name) {
            record.convergence = convergence;
        }
    }
}

#[async_trait]
impl CloudGateway for MemoryGateway {
    async fn describe_routing_rule(&self, rule_id: &str) -> GatewayResult<RoutingRule> {
        let mut state = self.state.lock().await;
        state.enter(GatewayOp::DescribeRoutingRule, rule_id)?;
        state
            .cloud
            .rule(rule_id)
            .cloned()
            .ok_or_else(|| GatewayError::not_found(ResourceKind::RoutingRule, rule_id))
    }

    async fn set_routing_rule(
        &self,
        rule_id: &str,
        targets: &[WeightedTarget],
        stickiness: Option<&Stickiness>,
    ) -> GatewayResult<()> {
        let mut state = self.state.lock().await;
        state.enter(GatewayOp::SetRoutingRule, rule_id)?;
        for target in targets {
            if state.cloud.target_group(&target.target_group_id).is_none() {
                return Err(GatewayError::not_found(
                    ResourceKind::TargetGroup,
                    &target.target_group_id,
                ));
            }
        }
        let rule = state
            .cloud
            .rule_mut(rule_id)
            .ok_or_else(|| GatewayError::not_found(ResourceKind::RoutingRule, rule_id))?;
        rule.targets = targets.to_vec();
        rule.stickiness = stickiness.cloned();
        let written = rule.clone();
        state.routing_writes.push(written);
        debug!(rule_id, ?targets, "routing rule updated");
        Ok(())
    }

    async fn describe_target_health(
        &self,
        target_group_id: &str,
    ) -> GatewayResult<Vec<TargetHealthState>> {
        let mut state = self.state.lock().await;
        state.enter(GatewayOp::DescribeTargetHealth, target_group_id)?;
        let tg = state
            .cloud
            .target_group(target_group_id)
            .ok_or_else(|| GatewayError::not_found(ResourceKind::TargetGroup, target_group_id))?;
        Ok(state.cloud.health_of(tg))
    }

    async fn describe_target_group(&self, target_group_id: &str) -> GatewayResult<TargetGroupInfo> {
        let mut state = self.state.lock().await;
        state.enter(GatewayOp::DescribeTargetGroup, target_group_id)?;
        state
            .cloud
            .target_group(target_group_id)
            .map(|tg| TargetGroupInfo {
                id: tg.id.clone(),
                name: tg.name.clone(),
            })
            .ok_or_else(|| GatewayError::not_found(ResourceKind::TargetGroup, target_group_id))
    }

    async fn describe_fleet(&self, fleet_name: &str) -> GatewayResult<FleetDescription> {
        let mut state = self.state.lock().await;
        state.enter(GatewayOp::DescribeFleet, fleet_name)?;
        let record = state
            .cloud
            .fleet_mut(fleet_name)
            .ok_or_else(|| GatewayError::not_found(ResourceKind::Fleet, fleet_name))?;

        let converged = match record.pending_polls.as_mut() {
            Some(left) => {
                *left = left.saturating_sub(1);
                *left == 0
            }
            None => false,
        };
        if converged {
            record.pending_polls = None;
            let desired = record.fleet.desired;
            record.resize(desired);
            debug!(fleet_name, desired, "fleet converged");
        }
        Ok(record.fleet.clone())
    }

    async fn update_fleet(&self, fleet_name: &str, update: &CapacityUpdate) -> GatewayResult<()> {
        let mut state = self.state.lock().await;
        state.enter(GatewayOp::UpdateFleet, fleet_name)?;
        let record = state
            .cloud
            .fleet_mut(fleet_name)
            .ok_or_else(|| GatewayError::not_found(ResourceKind::Fleet, fleet_name))?;

        let (desired, min, max) = update.applied_to(&record.fleet);
        if min > max || desired < min || desired > max {
            return Err(GatewayError::Rejected(format!(
                "desired capacity {desired} must be between min {min} and max {max}"
            )));
        }
        record.fleet.desired = desired;
        record.fleet.min = min;
        record.fleet.max = max;

        record.pending_polls = None;
        match record.convergence {
            Convergence::Immediate => record.resize(desired),
            Convergence::Manual => {}
            Convergence::AfterPolls { polls: 0 } => record.resize(desired),
            Convergence::AfterPolls { polls } => record.pending_polls = Some(polls),
        }
        debug!(fleet_name, %update, "fleet capacity updated");
        Ok(())
    }

    async fn list_scheduled_actions(&self, fleet_name: &str) -> GatewayResult<Vec<ScheduledAction>> {
        let mut state = self.state.lock().await;
        state.enter(GatewayOp::ListScheduledActions, fleet_name)?;
        state
            .cloud
            .fleet(fleet_name)
            .map(|r| r.scheduled_actions.clone())
            .ok_or_else(|| GatewayError::not_found(ResourceKind::Fleet, fleet_name))
    }

    async fn put_scheduled_action(
        &self,
        fleet_name: &str,
        action: &ScheduledAction,
    ) -> GatewayResult<()> {
        let mut state = self.state.lock().await;
        state.enter(GatewayOp::PutScheduledAction, &action.name)?;
        let record = state
            .cloud
            .fleet_mut(fleet_name)
            .ok_or_else(|| GatewayError::not_found(ResourceKind::Fleet, fleet_name))?;
        match record
            .scheduled_actions
            .iter_mut()
            .find(|a| a.name == action.name)
        {
            Some(existing) => *existing = action.clone(),
            None => record.scheduled_actions.push(action.clone()),
        }
        Ok(())
    }

    async fn delete_scheduled_action(
        &self,
        fleet_name: &str,
        action_name: &str,
    ) -> GatewayResult<()> {
        let mut state = self.state.lock().await;
        state.enter(GatewayOp::DeleteScheduledAction, action_name)?;
        let record = state
            .cloud
            .fleet_mut(fleet_name)
            .ok_or_else(|| GatewayError::not_found(ResourceKind::Fleet, fleet_name))?;
        let before = record.scheduled_actions.len();
        record.scheduled_actions.retain(|a| a.name != action_name);
        if record.scheduled_actions.len() == before {
            return Err(GatewayError::not_found(
                ResourceKind::ScheduledAction,
                action_name,
            ));
        }
        Ok(())
    }
}
