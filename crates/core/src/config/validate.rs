use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - API base URL and username are set
/// - Request timeout is not 0
/// - Pacing bounds are ordered
/// - A cycle can give up on sweeps that make no progress
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.api.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "api.base_url cannot be empty".to_string(),
        ));
    }

    if config.api.username.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "api.username cannot be empty".to_string(),
        ));
    }

    if config.api.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "api.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.restorer.min_delay_ms > config.restorer.max_delay_ms {
        return Err(ConfigError::ValidationError(format!(
            "restorer.min_delay_ms ({}) cannot exceed restorer.max_delay_ms ({})",
            config.restorer.min_delay_ms, config.restorer.max_delay_ms
        )));
    }

    if config.restorer.max_idle_sweeps == 0 {
        return Err(ConfigError::ValidationError(
            "restorer.max_idle_sweeps cannot be 0".to_string(),
        ));
    }

    Ok(())
}
