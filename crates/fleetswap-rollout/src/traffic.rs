//! Traffic controller: rewrites the weighted forward targets of the
//! routing rule.

use std::time::Duration;

use tracing::info;

use fleetswap_core::{DeploySettings, format_duration};
use fleetswap_gateway::{CloudGateway, WeightedTarget};

use crate::error::{DeployError, DeployResult};
use crate::resolver::{SlotWeights, resolve_weights};

/// Point the rule at exactly the two configured target groups with the
/// given weights. Stickiness is carried over from the current rule.
pub async fn set_weights(
    gateway: &dyn CloudGateway,
    settings: &DeploySettings,
    weights: SlotWeights,
) -> DeployResult<()> {
    for weight in [weights.blue, weights.green] {
        if weight > 100 {
            return Err(DeployError::InvalidWeight { weight });
        }
    }

    let rule_id = &settings.listener_rule_id;
    let current = gateway.describe_routing_rule(rule_id).await?;
    let targets = [
        WeightedTarget {
            target_group_id: settings.fleets.blue.target_group_id.clone(),
            weight: weights.blue,
        },
        WeightedTarget {
            target_group_id: settings.fleets.green.target_group_id.clone(),
            weight: weights.green,
        },
    ];
    gateway
        .set_routing_rule(rule_id, &targets, current.stickiness.as_ref())
        .await?;

    info!(
        rule = %rule_id,
        blue = weights.blue,
        green = weights.green,
        "traffic weights updated"
    );
    Ok(())
}

/// Exchange the blue and green weights.
///
/// With a non-zero `hold`, traffic is first split 50/50 for that long.
/// Returns the weights now in effect.
pub async fn swap(
    gateway: &dyn CloudGateway,
    settings: &DeploySettings,
    hold: Duration,
) -> DeployResult<SlotWeights> {
    let current = resolve_weights(gateway, settings).await?;
    let idling = current.idling_role()?;
    let next = current.swapped();
    info!(
        from_blue = current.blue,
        from_green = current.green,
        promoting = %idling,
        "swapping traffic"
    );

    if !hold.is_zero() {
        set_weights(gateway, settings, SlotWeights { blue: 50, green: 50 }).await?;
        info!(hold = %format_duration(hold), "holding traffic at 50/50");
        tokio::time::sleep(hold).await;
    }

    set_weights(gateway, settings, next).await?;
    Ok(next)
}
