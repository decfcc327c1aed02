//! File-backed simulated cloud.
//!
//! Loads a JSON [`CloudSnapshot`] into a [`MemoryGateway`] and writes it
//! back after every mutating call, so consecutive CLI invocations see
//! each other's changes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::CloudGateway;
use crate::memory::MemoryGateway;
use crate::snapshot::CloudSnapshot;
use crate::types::*;

#[derive(Debug, Clone)]
pub struct FileGateway {
    path: PathBuf,
    inner: MemoryGateway,
}

impl FileGateway {
    /// Open an existing snapshot file.
    pub async fn open(path: impl AsRef<Path>) -> GatewayResult<Self> {
        let path = path.as_ref().to_path_buf();
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| GatewayError::Io(format!("{}: {e}", path.display())))?;
        let cloud: CloudSnapshot = serde_json::from_str(&raw)
            .map_err(|e| GatewayError::Deserialize(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), fleets = cloud.fleets.len(), "loaded cloud snapshot");
        Ok(Self {
            path,
            inner: MemoryGateway::new(cloud),
        })
    }

    /// Open `path`, writing `seed` to it first if it does not exist yet.
    pub async fn open_or_seed(path: impl AsRef<Path>, seed: CloudSnapshot) -> GatewayResult<Self> {
        let path = path.as_ref();
        if tokio::fs::try_exists(path)
            .await
            .map_err(|e| GatewayError::Io(format!("{}: {e}", path.display())))?
        {
            return Self::open(path).await;
        }
        let gateway = Self {
            path: path.to_path_buf(),
            inner: MemoryGateway::new(seed),
        };
        gateway.persist().await?;
        debug!(path = %path.display(), "seeded cloud snapshot");
        Ok(gateway)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The in-memory state this gateway serves.
    pub fn memory(&self) -> &MemoryGateway {
        &self.inner
    }

    async fn persist(&self) -> GatewayResult<()> {
        let cloud = self.inner.snapshot().await;
        let json = serde_json::to_string_pretty(&cloud)
            .map_err(|e| GatewayError::Serialize(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| GatewayError::Io(format!("{}: {e}", parent.display())))?;
        }
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| GatewayError::Io(format!("{}: {e}", self.path.display())))
    }
}

#[async_trait]
impl CloudGateway for FileGateway {
    async fn describe_routing_rule(&self, rule_id: &str) -> GatewayResult<RoutingRule> {
        self.inner.describe_routing_rule(rule_id).await
    }

    async fn set_routing_rule(
        &self,
        rule_id: &str,
        targets: &[WeightedTarget],
        stickiness: Option<&Stickiness>,
    ) -> GatewayResult<()> {
        self.inner
            .set_routing_rule(rule_id, targets, stickiness)
            .await?;
        self.persist().await
    }

    async fn describe_target_health(
        &self,
        target_group_id: &str,
    ) -> GatewayResult<Vec<TargetHealthState>> {
        self.inner.describe_target_health(target_group_id).await
    }

    async fn describe_target_group(&self, target_group_id: &str) -> GatewayResult<TargetGroupInfo> {
        self.inner.describe_target_group(target_group_id).await
    }

    // Describing a fleet can advance its convergence, so it persists too.
    async fn describe_fleet(&self, fleet_name: &str) -> GatewayResult<FleetDescription> {
        let fleet = self.inner.describe_fleet(fleet_name).await?;
        self.persist().await?;
        Ok(fleet)
    }

    async fn update_fleet(&self, fleet_name: &str, update: &CapacityUpdate) -> GatewayResult<()> {
        self.inner.update_fleet(fleet_name, update).await?;
        self.persist().await
    }

    async fn list_scheduled_actions(&self, fleet_name: &str) -> GatewayResult<Vec<ScheduledAction>> {
        self.inner.list_scheduled_actions(fleet_name).await
    }

    async fn put_scheduled_action(
        &self,
        fleet_name: &str,
        action: &ScheduledAction,
    ) -> GatewayResult<()> {
        self.inner.put_scheduled_action(fleet_name, action).await?;
        self.persist().await
    }

    async fn delete_scheduled_action(
        &self,
        fleet_name: &str,
        action_name: &str,
    ) -> GatewayResult<()> {
        self.inner
            .delete_scheduled_action(fleet_name, action_name)
            .await?;
        self.persist().await
    }
}
