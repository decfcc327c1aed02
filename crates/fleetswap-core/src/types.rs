//! Shared types used across fleetswap crates.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One of the two symmetric fleet slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FleetRole {
    Blue,
    Green,
}

impl FleetRole {
    pub const ALL: [FleetRole; 2] = [FleetRole::Blue, FleetRole::Green];

    /// The other slot.
    pub fn counterpart(self) -> FleetRole {
        match self {
            FleetRole::Blue => FleetRole::Green,
            FleetRole::Green => FleetRole::Blue,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FleetRole::Blue => "blue",
            FleetRole::Green => "green",
        }
    }
}

impl fmt::Display for FleetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FleetRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blue" => Ok(FleetRole::Blue),
            "green" => Ok(FleetRole::Green),
            other => Err(format!("unknown fleet role {other:?}, expected blue or green")),
        }
    }
}

/// A configured fleet slot: the scaling group and the target group it registers into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSlot {
    pub fleet_name: String,
    pub target_group_id: String,
}

/// Bounded fixed-interval polling budget shared by every wait in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Always at least 1.
    pub max_attempts: u32,
    /// Sleep between attempts.
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }

    /// Upper bound on how long a single poll may block. Saturates at `Duration::MAX`.
    pub fn budget(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 120,
            interval: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_counterpart_is_symmetric() {
        for role in FleetRole::ALL {
            assert_ne!(role, role.counterpart());
            assert_eq!(role, role.counterpart().counterpart());
        }
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Blue".parse::<FleetRole>().unwrap(), FleetRole::Blue);
        assert_eq!("green".parse::<FleetRole>().unwrap(), FleetRole::Green);
        assert!("red".parse::<FleetRole>().is_err());
    }

    #[test]
    fn retry_policy_clamps_zero_attempts() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn retry_policy_budget() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.budget(), Duration::from_secs(1200));
    }

    #[test]
    fn retry_policy_budget_saturates() {
        let policy = RetryPolicy::new(120, Duration::from_secs(u64::MAX / 100));
        assert_eq!(policy.budget(), Duration::MAX);
    }
}
