//! Error types for gateway calls.

use std::fmt;

use thiserror::Error;

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Kind of cloud resource a lookup was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    RoutingRule,
    TargetGroup,
    Fleet,
    ScheduledAction,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::RoutingRule => "routing rule",
            ResourceKind::TargetGroup => "target group",
            ResourceKind::Fleet => "fleet",
            ResourceKind::ScheduledAction => "scheduled action",
        })
    }
}

/// Any failure talking to the cloud provider.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: ResourceKind, id: String },

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("snapshot i/o error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),
}

impl GatewayError {
    pub fn not_found(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}
