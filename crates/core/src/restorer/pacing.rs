//! Randomized pause between restore requests.

use std::time::Duration;

use rand::Rng;

use super::config::RestorerConfig;

/// Draw the pause to take after a restore request.
///
/// Uniform over `[min_delay_ms, max_delay_ms)`. A degenerate range yields
/// `min_delay_ms`, and no pause at all when that is zero.
pub fn next_delay(config: &RestorerConfig) -> Option<Duration> {
    let ms = if config.max_delay_ms > config.min_delay_ms {
        rand::rng().random_range(config.min_delay_ms..config.max_delay_ms)
    } else {
        config.min_delay_ms
    };

    (ms > 0).then(|| Duration::from_millis(ms))
}
