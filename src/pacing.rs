//! Randomized pacing between store requests.

use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

use crate::config::PacingConfig;

/// Sleeps `base + uniform(0..=jitter)` between consecutive requests.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    config: PacingConfig,
}

impl Pacer {
    pub fn new(config: PacingConfig) -> Self {
        Self { config }
    }

    /// Draw the next delay.
    pub fn next_delay(&self) -> Duration {
        let jitter_ms = self.config.jitter.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        self.config.base + Duration::from_millis(extra)
    }

    pub async fn pause(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }
        tracing::debug!(delay_ms = delay.as_millis() as u64, "pacing before next request");
        sleep(delay).await;
    }
}
