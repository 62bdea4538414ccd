//! Restorer configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the restoration sweeps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestorerConfig {
    /// Lower bound of the pause after each restore request (milliseconds).
    #[serde(default)]
    pub min_delay_ms: u64,

    /// Upper bound (exclusive) of the pause after each restore request
    /// (milliseconds). The pause is drawn uniformly from the range.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Maximum sweeps per cycle (0 = keep sweeping until the catalog drains).
    #[serde(default)]
    pub max_sweeps_per_cycle: u32,

    /// Consecutive sweeps that resolve nothing before the cycle gives up and
    /// leaves the rest for the next cycle.
    #[serde(default = "default_max_idle_sweeps")]
    pub max_idle_sweeps: u32,

    /// Pause between two sweeps of the same cycle (seconds).
    /// Accounts stopped by the service's rate limit wait at least this long.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_max_delay() -> u64 {
    1000
}

fn default_max_idle_sweeps() -> u32 {
    3
}

fn default_sweep_interval() -> u64 {
    60
}

impl Default for RestorerConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 0,
            max_delay_ms: default_max_delay(),
            max_sweeps_per_cycle: 0,
            max_idle_sweeps: default_max_idle_sweeps(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl RestorerConfig {
    /// No pacing and no pause between sweeps.
    pub fn immediate() -> Self {
        Self {
            min_delay_ms: 0,
            max_delay_ms: 0,
            max_sweeps_per_cycle: 0,
            max_idle_sweeps: default_max_idle_sweeps(),
            sweep_interval_secs: 0,
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
