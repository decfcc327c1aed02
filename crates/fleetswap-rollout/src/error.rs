//! Deployment error types.

use thiserror::Error;

use fleetswap_core::FleetRole;
use fleetswap_gateway::GatewayError;
use fleetswap_health::HealthGateError;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error(
        "ambiguous traffic split (blue={blue}, green={green}): exactly one fleet must have weight 0"
    )]
    AmbiguousTrafficSplit { blue: u32, green: u32 },

    #[error("{role} target group {target_group_id} is not a target of the routing rule")]
    MissingTarget {
        role: FleetRole,
        target_group_id: String,
    },

    #[error("{operation} did not complete after {attempts} attempts")]
    RetryTimeout { operation: String, attempts: u32 },

    #[error("deployment cancelled and rolled back: {reason}")]
    Cancelled { reason: String },

    /// The teardown after a failed health check itself failed.
    #[error("{source} (rolling back after: {reason})")]
    RollbackFailed {
        #[source]
        source: Box<DeployError>,
        reason: String,
    },

    #[error("invalid weight {weight}: must be between 0 and 100")]
    InvalidWeight { weight: u32 },
}

pub type DeployResult<T> = Result<T, DeployError>;

impl From<HealthGateError> for DeployError {
    fn from(e: HealthGateError) -> Self {
        match e {
            HealthGateError::Timeout {
                target_group_id,
                attempts,
                ..
            } => DeployError::RetryTimeout {
                operation: format!("health check of {target_group_id}"),
                attempts,
            },
            HealthGateError::Gateway(e) => DeployError::Gateway(e),
        }
    }
}
