use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::restorer::RestorerConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub restorer: RestorerConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Remote service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Service root (e.g., "https://example.org"). Endpoints are resolved under it.
    pub base_url: String,
    /// Account name sent with every request
    pub username: String,
    /// File holding the API token, read once at startup
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_token_path() -> PathBuf {
    PathBuf::from("token.txt")
}

fn default_timeout() -> u32 {
    30
}

/// How often whole restoration cycles are repeated
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScheduleConfig {
    /// Seconds between cycles. 0 runs a single cycle and exits.
    #[serde(default)]
    pub cycle_interval_secs: u64,
}
