//! Blue/Green deployment scenarios against the in-memory cloud.
//!
//! Each test seeds a cloud where green serves all traffic from one
//! healthy instance and blue is idle, then drives the orchestrator.

use std::sync::{Arc, Mutex};

use fleetswap_core::{DeploySettings, FleetRole, FleetSlot, FleetswapConfig};
use fleetswap_gateway::*;
use fleetswap_rollout::*;

const RULE: &str = "rule/app";

fn settings(max_attempts: u32) -> DeploySettings {
    let mut config = FleetswapConfig::scaffold(
        RULE,
        FleetSlot {
            fleet_name: "app-blue".into(),
            target_group_id: "tg/app-blue".into(),
        },
        FleetSlot {
            fleet_name: "app-green".into(),
            target_group_id: "tg/app-green".into(),
        },
    );
    config.retry_policy.max_attempts = max_attempts;
    config.retry_policy.interval_secs = 0;
    config.settings().unwrap()
}

fn seeded() -> CloudSnapshot {
    CloudSnapshot::seeded(
        RULE,
        ("app-blue", "tg/app-blue"),
        ("app-green", "tg/app-green"),
    )
}

fn orchestrator(gw: &MemoryGateway, max_attempts: u32) -> Orchestrator {
    Orchestrator::new(Arc::new(gw.clone()), settings(max_attempts))
}

fn capacity(fleet: &FleetDescription) -> (u32, u32, u32) {
    (fleet.desired, fleet.min, fleet.max)
}

#[derive(Default)]
struct RecordingReporter {
    views: Mutex<Vec<StatusView>>,
}

impl StatusReporter for RecordingReporter {
    fn report(&self, view: &StatusView) {
        self.views.lock().unwrap().push(view.clone());
    }
}

// ── deploy ────────────────────────────────────────────────────────

#[tokio::test]
async fn deploy_promotes_idling_fleet() {
    let gw = MemoryGateway::new(seeded());
    let mut orch = orchestrator(&gw, 3);

    orch.deploy(DeployOptions::default()).await.unwrap();

    assert_eq!(gw.weight(RULE, "tg/app-blue").await, Some(100));
    assert_eq!(gw.weight(RULE, "tg/app-green").await, Some(0));
    assert_eq!(capacity(&gw.fleet("app-blue").await.unwrap()), (1, 1, 2));
    assert_eq!(capacity(&gw.fleet("app-green").await.unwrap()), (1, 0, 2));
    assert_eq!(orch.phase(), DeployPhase::Done);
    assert_eq!(
        orch.history(),
        &[
            DeployPhase::Idle,
            DeployPhase::PreCleanup,
            DeployPhase::Provisioning,
            DeployPhase::HealthChecking,
            DeployPhase::Swapping,
            DeployPhase::PostCleanup,
            DeployPhase::Done,
        ]
    );
}

#[tokio::test]
async fn deploy_reports_status_at_each_display_point() {
    let gw = MemoryGateway::new(seeded());
    let reporter = Arc::new(RecordingReporter::default());
    let mut orch = orchestrator(&gw, 3).with_reporter(reporter.clone());

    orch.deploy(DeployOptions::default()).await.unwrap();

    // start, after health, after swap, after post-cleanup; pre-cleanup was skipped.
    let views = reporter.views.lock().unwrap();
    assert_eq!(views.len(), 4);
    assert_eq!(views[0].fleet(FleetRole::Green).unwrap().weight, Some(100));
    assert_eq!(views[2].fleet(FleetRole::Blue).unwrap().weight, Some(100));
    assert_eq!(views[3].fleet(FleetRole::Green).unwrap().min, 0);
}

#[tokio::test]
async fn deploy_drains_leftover_idling_instances_first() {
    let gw = MemoryGateway::new(seeded());
    gw.update_fleet(
        "app-blue",
        &CapacityUpdate {
            desired: Some(2),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let reporter = Arc::new(RecordingReporter::default());
    let mut orch = orchestrator(&gw, 3).with_reporter(reporter.clone());

    orch.deploy(DeployOptions::default()).await.unwrap();

    assert_eq!(reporter.views.lock().unwrap().len(), 5);
    // Leftovers were drained, then the fleet relaunched at green's size.
    let blue = gw.fleet("app-blue").await.unwrap();
    assert_eq!(capacity(&blue), (1, 1, 2));
    assert_eq!(blue.instances.len(), 1);
    assert_eq!(blue.instances[0].id, "app-blue-3");
}

#[tokio::test]
async fn deploy_without_swap_leaves_traffic() {
    let gw = MemoryGateway::new(seeded());
    let mut orch = orchestrator(&gw, 3);

    orch.deploy(DeployOptions {
        swap: false,
        cleanup_after: false,
        ..Default::default()
    })
    .await
    .unwrap();

    assert_eq!(gw.weight(RULE, "tg/app-green").await, Some(100));
    assert_eq!(gw.calls(GatewayOp::SetRoutingRule).await, 0);
    assert_eq!(capacity(&gw.fleet("app-blue").await.unwrap()), (1, 1, 2));
    assert_eq!(capacity(&gw.fleet("app-green").await.unwrap()), (1, 1, 2));
}

#[tokio::test]
async fn deploy_with_hold_ends_on_swapped_weights() {
    let gw = MemoryGateway::new(seeded());
    let mut orch = orchestrator(&gw, 3);

    orch.deploy(DeployOptions {
        swap_hold: std::time::Duration::from_millis(5),
        ..Default::default()
    })
    .await
    .unwrap();

    // Blue 50 / green 50 during the hold, then the exchange.
    let written: Vec<Vec<(String, u32)>> = gw
        .routing_history(RULE)
        .await
        .into_iter()
        .map(|targets| {
            targets
                .into_iter()
                .map(|t| (t.target_group_id, t.weight))
                .collect()
        })
        .collect();
    assert_eq!(
        written,
        vec![
            vec![("tg/app-blue".to_string(), 50), ("tg/app-green".to_string(), 50)],
            vec![("tg/app-blue".to_string(), 100), ("tg/app-green".to_string(), 0)],
        ]
    );
    assert_eq!(gw.weight(RULE, "tg/app-blue").await, Some(100));
}

#[tokio::test]
async fn ambiguous_split_aborts_before_any_mutation() {
    let gw = MemoryGateway::new(seeded());
    set_weights(&gw, &settings(3), SlotWeights { blue: 0, green: 0 })
        .await
        .unwrap();
    let mut orch = orchestrator(&gw, 3);

    let err = orch.deploy(DeployOptions::default()).await.unwrap_err();

    assert!(matches!(
        err,
        DeployError::AmbiguousTrafficSplit { blue: 0, green: 0 }
    ));
    assert_eq!(gw.calls(GatewayOp::UpdateFleet).await, 0);
    assert_eq!(orch.history(), &[DeployPhase::Idle, DeployPhase::Failed]);
}

#[tokio::test]
async fn provisioning_error_propagates() {
    let gw = MemoryGateway::new(seeded());
    gw.fail(GatewayOp::UpdateFleet, Some("app-blue"), "limit exceeded")
        .await;
    let mut orch = orchestrator(&gw, 3);

    let err = orch.deploy(DeployOptions::default()).await.unwrap_err();

    assert!(matches!(err, DeployError::Gateway(GatewayError::Transport(_))));
    assert_eq!(orch.phase(), DeployPhase::Failed);
    assert!(!orch.history().contains(&DeployPhase::HealthChecking));
    assert_eq!(gw.weight(RULE, "tg/app-green").await, Some(100));
}

// ── rollback on health timeout ────────────────────────────────────

#[tokio::test]
async fn health_timeout_tears_idling_fleet_down() {
    let gw = MemoryGateway::new(seeded());
    gw.set_target_health("tg/app-blue", HealthSource::Fixed { states: vec![] })
        .await;
    let mut orch = orchestrator(&gw, 3);

    let err = orch.deploy(DeployOptions::default()).await.unwrap_err();

    assert!(matches!(err, DeployError::Cancelled { .. }), "{err}");
    let blue = gw.fleet("app-blue").await.unwrap();
    assert_eq!((blue.desired, blue.min), (0, 0));
    assert!(blue.instances.is_empty());
    assert_eq!(gw.weight(RULE, "tg/app-blue").await, Some(0));
    assert_eq!(gw.weight(RULE, "tg/app-green").await, Some(100));
    assert_eq!(gw.calls(GatewayOp::SetRoutingRule).await, 0);
    assert!(orch.history().ends_with(&[
        DeployPhase::HealthChecking,
        DeployPhase::RollingBack,
        DeployPhase::Failed,
    ]));
}

#[tokio::test]
async fn stalled_teardown_is_rollback_failed() {
    let gw = MemoryGateway::new(seeded());
    gw.set_target_health("tg/app-blue", HealthSource::Fixed { states: vec![] })
        .await;
    // A stuck instance the fleet never gets rid of.
    gw.set_convergence("app-blue", Convergence::Manual).await;
    gw.set_instances(
        "app-blue",
        vec![Instance {
            id: "app-blue-stuck".into(),
            lifecycle_state: LifecycleState::Terminating,
        }],
    )
    .await;
    let mut orch = orchestrator(&gw, 3);

    let err = orch
        .deploy(DeployOptions {
            cleanup_before: false,
            ..Default::default()
        })
        .await
        .unwrap_err();

    match &err {
        DeployError::RollbackFailed { source, .. } => {
            assert!(matches!(**source, DeployError::RetryTimeout { attempts: 3, .. }));
        }
        other => panic!("expected RollbackFailed, got {other}"),
    }
    assert!(err.to_string().starts_with("drain of fleet app-blue"));
    assert_eq!(gw.weight(RULE, "tg/app-green").await, Some(100));
}

// ── rollback command ──────────────────────────────────────────────

#[tokio::test]
async fn rollback_returns_traffic_to_previous_fleet() {
    let gw = MemoryGateway::new(seeded());
    let mut orch = orchestrator(&gw, 3);
    orch.deploy(DeployOptions::default()).await.unwrap();

    orch.rollback().await.unwrap();

    assert_eq!(gw.weight(RULE, "tg/app-green").await, Some(100));
    assert_eq!(gw.weight(RULE, "tg/app-blue").await, Some(0));
    // The fleet that lost traffic keeps its capacity.
    assert_eq!(capacity(&gw.fleet("app-blue").await.unwrap()), (1, 1, 2));
    assert_eq!(capacity(&gw.fleet("app-green").await.unwrap()), (1, 1, 2));
    assert!(!orch.history().contains(&DeployPhase::PreCleanup));
    assert!(!orch.history().contains(&DeployPhase::PostCleanup));
}

// ── capacity ──────────────────────────────────────────────────────

#[tokio::test]
async fn set_capacity_changes_only_desired() {
    let gw = MemoryGateway::new(seeded());
    gw.update_fleet(
        "app-green",
        &CapacityUpdate {
            max: Some(10),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let orch = orchestrator(&gw, 3);

    orch.set_capacity(
        FleetRole::Green,
        CapacityUpdate::from_signed(Some(5), Some(-1), Some(-1)),
        CapacityWait::None,
    )
    .await
    .unwrap();

    assert_eq!(capacity(&gw.fleet("app-green").await.unwrap()), (5, 1, 10));
}

#[tokio::test]
async fn drain_wait_depends_on_budget() {
    for (max_attempts, should_drain) in [(4, true), (5, true), (3, false)] {
        let gw = MemoryGateway::new(seeded());
        gw.set_convergence("app-green", Convergence::AfterPolls { polls: 4 })
            .await;
        let orch = orchestrator(&gw, max_attempts);

        let result = orch
            .set_capacity(
                FleetRole::Green,
                CapacityUpdate::from_signed(Some(0), Some(0), None),
                CapacityWait::Drain,
            )
            .await;

        if should_drain {
            result.unwrap();
            assert!(gw.fleet("app-green").await.unwrap().instances.is_empty());
        } else {
            assert!(matches!(
                result,
                Err(DeployError::RetryTimeout { attempts: 3, .. })
            ));
        }
    }
}

#[tokio::test]
async fn cleanup_idle_after_deploy() {
    let gw = MemoryGateway::new(seeded());
    let mut orch = orchestrator(&gw, 3);
    orch.deploy(DeployOptions::default()).await.unwrap();

    assert_eq!(orch.cleanup_idle().await.unwrap(), CleanupOutcome::Done);
    let green = gw.fleet("app-green").await.unwrap();
    assert_eq!(capacity(&green), (0, 0, 2));
    assert!(green.instances.is_empty());

    assert_eq!(orch.cleanup_idle().await.unwrap(), CleanupOutcome::Skipped);
}

// ── scheduled actions ─────────────────────────────────────────────

#[tokio::test]
async fn migration_continues_past_a_failed_copy() {
    let actions = ["nightly-down", "morning-up", "weekend-off"]
        .into_iter()
        .map(|name| ScheduledAction {
            desired: Some(1),
            recurrence: Some("0 0 * * *".into()),
            ..ScheduledAction::named(name)
        })
        .collect();
    let gw = MemoryGateway::new(seeded().with_scheduled_actions("app-green", actions));
    gw.fail(GatewayOp::PutScheduledAction, Some("morning-up"), "throttled")
        .await;
    let orch = orchestrator(&gw, 3);

    let report = orch
        .move_scheduled_actions("app-green", "app-blue")
        .await
        .unwrap();

    assert_eq!(report.moved, vec!["nightly-down", "weekend-off"]);
    assert_eq!(report.failed, vec!["morning-up"]);
    assert_eq!(
        gw.scheduled_action_names("app-blue").await,
        vec!["nightly-down", "weekend-off"]
    );
    assert_eq!(gw.scheduled_action_names("app-green").await, vec!["morning-up"]);
}
