//! Health gate: wait for a target group to report a healthy quorum.

use thiserror::Error;
use tracing::{info, warn};

use fleetswap_core::{Attempt, RetryError, RetryPolicy, poll};
use fleetswap_gateway::{CloudGateway, GatewayError};

use crate::snapshot::HealthSnapshot;

#[derive(Debug, Error)]
pub enum HealthGateError {
    #[error(
        "target group {target_group_id} did not reach {desired} healthy targets after {attempts} attempts"
    )]
    Timeout {
        target_group_id: String,
        desired: u32,
        attempts: u32,
    },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

pub type HealthGateResult<T> = Result<T, HealthGateError>;

/// Poll `target_group_id` until at least `desired` targets are healthy.
///
/// Returns the snapshot that satisfied the gate. Counts are logged on
/// every attempt. Gateway errors are not retried.
pub async fn await_healthy(
    gateway: &dyn CloudGateway,
    target_group_id: &str,
    desired: u32,
    policy: &RetryPolicy,
) -> HealthGateResult<HealthSnapshot> {
    info!(
        target_group = target_group_id,
        desired,
        max_attempts = policy.max_attempts,
        budget_secs = policy.budget().as_secs(),
        "waiting for healthy targets"
    );

    let result = poll(policy, move |attempt| async move {
        let states = gateway.describe_target_health(target_group_id).await?;
        let snapshot = HealthSnapshot::tally(&states);
        info!(
            target_group = target_group_id,
            attempt = attempt + 1,
            total = snapshot.total,
            healthy = snapshot.healthy,
            unhealthy = snapshot.unhealthy,
            unused = snapshot.unused,
            initial = snapshot.initial,
            draining = snapshot.draining,
            "target health"
        );
        if snapshot.satisfies(desired) {
            Ok::<_, GatewayError>(Attempt::Done(snapshot))
        } else {
            Ok(Attempt::Retry)
        }
    })
    .await;

    match result {
        Ok(snapshot) => {
            info!(target_group = target_group_id, healthy = snapshot.healthy, "health gate passed");
            Ok(snapshot)
        }
        Err(RetryError::Exhausted { attempts }) => {
            warn!(target_group = target_group_id, attempts, desired, "health gate timed out");
            Err(HealthGateError::Timeout {
                target_group_id: target_group_id.to_string(),
                desired,
                attempts,
            })
        }
        Err(RetryError::Aborted(e)) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use fleetswap_gateway::{
        CloudSnapshot, GatewayOp, HealthSource, MemoryGateway, TargetHealthState,
    };

    use super::*;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    fn gateway() -> MemoryGateway {
        MemoryGateway::new(CloudSnapshot::seeded(
            "rule",
            ("blue", "tg-blue"),
            ("green", "tg-green"),
        ))
    }

    #[tokio::test]
    async fn passes_when_quorum_is_met() {
        let gw = gateway();
        let snapshot = await_healthy(&gw, "tg-green", 1, &policy(3)).await.unwrap();
        assert_eq!(snapshot.healthy, 1);
        assert_eq!(gw.calls(GatewayOp::DescribeTargetHealth).await, 1);
    }

    #[tokio::test]
    async fn zero_desired_passes_on_empty_group() {
        let gw = gateway();
        let snapshot = await_healthy(&gw, "tg-blue", 0, &policy(3)).await.unwrap();
        assert_eq!(snapshot.total, 0);
    }

    #[tokio::test]
    async fn times_out_after_budget() {
        let gw = gateway();
        gw.set_target_health(
            "tg-blue",
            HealthSource::Fixed {
                states: vec![TargetHealthState::Initial, TargetHealthState::Unhealthy],
            },
        )
        .await;

        let err = await_healthy(&gw, "tg-blue", 1, &policy(4)).await.unwrap_err();
        assert!(matches!(err, HealthGateError::Timeout { attempts: 4, desired: 1, .. }));
        assert_eq!(gw.calls(GatewayOp::DescribeTargetHealth).await, 4);
    }

    #[tokio::test]
    async fn gateway_error_is_not_retried() {
        let gw = gateway();
        gw.fail(GatewayOp::DescribeTargetHealth, None, "access denied")
            .await;

        let err = await_healthy(&gw, "tg-green", 1, &policy(5)).await.unwrap_err();
        assert!(matches!(err, HealthGateError::Gateway(GatewayError::Transport(_))));
        assert_eq!(gw.calls(GatewayOp::DescribeTargetHealth).await, 1);
    }
}
