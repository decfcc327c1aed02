//! The capability trait every cloud adapter implements.

use async_trait::async_trait;

use crate::error::GatewayResult;
use crate::types::*;

/// Read/modify operations the deployer needs from the cloud provider.
///
/// Implementations are expected to be cheap to share (`Arc<dyn CloudGateway>`)
/// and to serialize conflicting writes themselves.
#[async_trait]
pub trait CloudGateway: Send + Sync {
    /// Read the weighted forward targets and stickiness of a routing rule.
    async fn describe_routing_rule(&self, rule_id: &str) -> GatewayResult<RoutingRule>;

    /// Replace the forward targets of a routing rule.
    async fn set_routing_rule(
        &self,
        rule_id: &str,
        targets: &[WeightedTarget],
        stickiness: Option<&Stickiness>,
    ) -> GatewayResult<()>;

    /// Raw health state of every target registered in a target group.
    async fn describe_target_health(
        &self,
        target_group_id: &str,
    ) -> GatewayResult<Vec<TargetHealthState>>;

    async fn describe_target_group(&self, target_group_id: &str) -> GatewayResult<TargetGroupInfo>;

    async fn describe_fleet(&self, fleet_name: &str) -> GatewayResult<FleetDescription>;

    /// Apply the present fields of `update` to a fleet.
    async fn update_fleet(&self, fleet_name: &str, update: &CapacityUpdate) -> GatewayResult<()>;

    async fn list_scheduled_actions(&self, fleet_name: &str) -> GatewayResult<Vec<ScheduledAction>>;

    /// Create or replace (by name) a scheduled action on a fleet.
    async fn put_scheduled_action(
        &self,
        fleet_name: &str,
        action: &ScheduledAction,
    ) -> GatewayResult<()>;

    async fn delete_scheduled_action(&self, fleet_name: &str, action_name: &str)
    -> GatewayResult<()>;
}
