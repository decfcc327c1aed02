//! Point-in-time health tally of one target group.

use std::fmt;

use serde::Serialize;

use fleetswap_gateway::TargetHealthState;

/// Per-state target counts, tallied from raw health states at read time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    pub total: usize,
    pub healthy: usize,
    pub unhealthy: usize,
    pub unused: usize,
    pub initial: usize,
    pub draining: usize,
}

impl HealthSnapshot {
    pub fn tally(states: &[TargetHealthState]) -> Self {
        let mut snapshot = Self {
            total: states.len(),
            ..Default::default()
        };
        for state in states {
            match state {
                TargetHealthState::Healthy => snapshot.healthy += 1,
                TargetHealthState::Unhealthy => snapshot.unhealthy += 1,
                TargetHealthState::Unused => snapshot.unused += 1,
                TargetHealthState::Initial => snapshot.initial += 1,
                TargetHealthState::Draining => snapshot.draining += 1,
            }
        }
        snapshot
    }

    /// Whether at least `desired` targets are healthy.
    pub fn satisfies(&self, desired: u32) -> bool {
        self.healthy >= desired as usize
    }
}

impl fmt::Display for HealthSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total:{}, healthy:{}, unhealthy:{}, unused:{}, initial:{}, draining:{}",
            self.total, self.healthy, self.unhealthy, self.unused, self.initial, self.draining
        )
    }
}
