//! Deployment orchestrator — drives the Blue/Green state machine.
//!
//! ```text
//! Idle → PreCleanup → Provisioning → HealthChecking ─┬→ Swapping → PostCleanup → Done
//!                                                    └→ RollingBack (health timeout)
//! Failed is reachable from any step.
//! ```
//!
//! Steps run strictly in order on the calling task. The only error that
//! is caught and compensated is a health-check timeout, which tears the
//! idling fleet back down and reports [`DeployError::Cancelled`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};

use fleetswap_core::{DeploySettings, FleetRole};
use fleetswap_gateway::{CapacityUpdate, CloudGateway};
use fleetswap_health::{HealthGateError, await_healthy};

use crate::capacity::{
    CapacityWait, CleanupOutcome, cleanup_idling_fleet, teardown, update_capacity,
    update_capacity_for_role,
};
use crate::error::{DeployError, DeployResult};
use crate::resolver::{DeployInfo, SlotWeights, resolve};
use crate::schedule::{MigrationReport, move_scheduled_actions};
use crate::status::{NoopReporter, StatusReporter, StatusView, collect_status};
use crate::traffic::swap;

/// Phase of a deployment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeployPhase {
    Idle,
    PreCleanup,
    Provisioning,
    HealthChecking,
    Swapping,
    RollingBack,
    PostCleanup,
    Done,
    Failed,
}

impl fmt::Display for DeployPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Switches for one [`Orchestrator::deploy`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployOptions {
    /// Move traffic to the new fleet once it is healthy.
    pub swap: bool,
    /// Drain a non-empty idling fleet before provisioning it.
    pub cleanup_before: bool,
    /// Drop the min capacity of the fleet that lost traffic.
    pub cleanup_after: bool,
    /// How long to hold a 50/50 split during the swap. Zero skips it.
    pub swap_hold: Duration,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            swap: true,
            cleanup_before: true,
            cleanup_after: true,
            swap_hold: Duration::ZERO,
        }
    }
}

impl DeployOptions {
    /// Bring the idling fleet up to match the running one and send it
    /// traffic, leaving the old fleet's capacity alone.
    pub fn rollback() -> Self {
        Self {
            swap: true,
            cleanup_before: false,
            cleanup_after: false,
            swap_hold: Duration::ZERO,
        }
    }
}

pub struct Orchestrator {
    gateway: Arc<dyn CloudGateway>,
    settings: DeploySettings,
    reporter: Arc<dyn StatusReporter>,
    phase: DeployPhase,
    history: Vec<DeployPhase>,
}

impl Orchestrator {
    pub fn new(gateway: Arc<dyn CloudGateway>, settings: DeploySettings) -> Self {
        Self {
            gateway,
            settings,
            reporter: Arc::new(NoopReporter),
            phase: DeployPhase::Idle,
            history: vec![DeployPhase::Idle],
        }
    }

    /// Receive a status view at each display point of a workflow.
    pub fn with_reporter(mut self, reporter: Arc<dyn StatusReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn settings(&self) -> &DeploySettings {
        &self.settings
    }

    /// Phase the last (or current) run is in.
    pub fn phase(&self) -> DeployPhase {
        self.phase
    }

    /// Every phase entered by the last run, in order.
    pub fn history(&self) -> &[DeployPhase] {
        &self.history
    }

    /// Provision the idling fleet, gate on its health, then optionally
    /// swap traffic and clean up.
    pub async fn deploy(&mut self, options: DeployOptions) -> DeployResult<()> {
        self.phase = DeployPhase::Idle;
        self.history = vec![DeployPhase::Idle];

        let result = self.run(options).await;
        match &result {
            Ok(()) => {
                self.enter(DeployPhase::Done);
                info!("deployment finished");
            }
            Err(e) => {
                self.enter(DeployPhase::Failed);
                error!(error = %e, "deployment failed");
            }
        }
        result
    }

    /// Send traffic back to the idling fleet.
    pub async fn rollback(&mut self) -> DeployResult<()> {
        info!("rolling back to the idling fleet");
        self.deploy(DeployOptions::rollback()).await
    }

    pub async fn status(&self) -> DeployResult<StatusView> {
        collect_status(self.gateway.as_ref(), &self.settings).await
    }

    pub async fn cleanup_idle(&self) -> DeployResult<CleanupOutcome> {
        let outcome = cleanup_idling_fleet(self.gateway.as_ref(), &self.settings).await?;
        self.display_status().await?;
        Ok(outcome)
    }

    pub async fn swap(&self, hold: Duration) -> DeployResult<SlotWeights> {
        let weights = swap(self.gateway.as_ref(), &self.settings, hold).await?;
        self.display_status().await?;
        Ok(weights)
    }

    pub async fn set_capacity(
        &self,
        role: FleetRole,
        update: CapacityUpdate,
        wait: CapacityWait,
    ) -> DeployResult<()> {
        update_capacity_for_role(self.gateway.as_ref(), &self.settings, role, update, wait)
            .await?;
        self.display_status().await
    }

    pub async fn move_scheduled_actions(&self, from: &str, to: &str) -> DeployResult<MigrationReport> {
        move_scheduled_actions(self.gateway.as_ref(), from, to).await
    }

    async fn run(&mut self, options: DeployOptions) -> DeployResult<()> {
        let gateway = Arc::clone(&self.gateway);
        let gateway = gateway.as_ref();
        let settings = self.settings.clone();
        let policy = settings.retry_policy;

        let info = resolve(gateway, &settings).await?;
        info!(
            idling = %info.idling.role,
            idling_fleet = %info.idling.fleet.name,
            running = %info.running.role,
            running_fleet = %info.running.fleet.name,
            "starting deployment"
        );
        self.display_status().await?;

        if options.cleanup_before {
            self.enter(DeployPhase::PreCleanup);
            if cleanup_idling_fleet(gateway, &settings).await? == CleanupOutcome::Done {
                self.display_status().await?;
            }
        }

        self.enter(DeployPhase::Provisioning);
        let update = CapacityUpdate::matching(&info.running.fleet);
        info!(fleet = %info.idling.fleet.name, %update, "provisioning idling fleet");
        update_capacity(
            gateway,
            &policy,
            &info.idling.fleet.name,
            update,
            CapacityWait::None,
        )
        .await?;

        self.enter(DeployPhase::HealthChecking);
        let desired = info.running.fleet.desired;
        match await_healthy(gateway, &info.idling.target_group_id, desired, &policy).await {
            Ok(_) => {}
            Err(e @ HealthGateError::Timeout { .. }) => {
                return Err(self.roll_back(gateway, &info, e.to_string()).await);
            }
            Err(e) => return Err(e.into()),
        }
        self.display_status().await?;

        if options.swap {
            self.enter(DeployPhase::Swapping);
            swap(gateway, &settings, options.swap_hold).await?;
            self.display_status().await?;
        }

        if options.cleanup_after {
            self.enter(DeployPhase::PostCleanup);
            let now = resolve(gateway, &settings).await?;
            info!(fleet = %now.idling.fleet.name, "releasing min capacity of idle fleet");
            update_capacity(
                gateway,
                &policy,
                &now.idling.fleet.name,
                CapacityUpdate {
                    min: Some(0),
                    ..Default::default()
                },
                CapacityWait::None,
            )
            .await?;
            self.display_status().await?;
        }

        Ok(())
    }

    /// Tear the idling fleet back down after a failed health gate.
    async fn roll_back(
        &mut self,
        gateway: &dyn CloudGateway,
        info: &DeployInfo,
        reason: String,
    ) -> DeployError {
        self.enter(DeployPhase::RollingBack);
        warn!(fleet = %info.idling.fleet.name, %reason, "health check failed, tearing down idling fleet");
        match update_capacity(
            gateway,
            &self.settings.retry_policy,
            &info.idling.fleet.name,
            teardown(),
            CapacityWait::Drain,
        )
        .await
        {
            Ok(()) => DeployError::Cancelled { reason },
            Err(e) => DeployError::RollbackFailed {
                source: Box::new(e),
                reason,
            },
        }
    }

    async fn display_status(&self) -> DeployResult<()> {
        let view = self.status().await?;
        self.reporter.report(&view);
        Ok(())
    }

    fn enter(&mut self, phase: DeployPhase) {
        info!(from = %self.phase, to = %phase, "deployment phase");
        self.phase = phase;
        self.history.push(phase);
    }
}
