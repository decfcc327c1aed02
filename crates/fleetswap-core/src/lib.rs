//! fleetswap-core — shared building blocks for Blue/Green fleet deployments.
//!
//! - **`config`** — `fleetswap.toml` parsing and validation
//! - **`types`** — fleet roles, fleet slots, retry policy
//! - **`retry`** — fixed-interval bounded polling loop
//! - **`duration`** — `"5s"` / `"500ms"` / `"2m"` duration notation

pub mod config;
pub mod duration;
pub mod error;
pub mod retry;
pub mod types;

pub use config::{DeploySettings, FleetSlots, FleetswapConfig, GatewayConfig, GatewayKind};
pub use duration::{format_duration, parse_duration};
pub use error::{ConfigError, ConfigResult};
pub use retry::{Attempt, RetryError, poll};
pub use types::*;
