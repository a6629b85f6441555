use std::thread;
use std::time::Duration;

use crate::traits::PublishError;

/// Bounded exponential backoff for transient registry failures.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay between retries.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// No waiting between attempts; for tests.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }
}

/// Runs `operation`, retrying transient failures up to the configured
/// attempt count with doubling delays. Rejections return immediately.
pub(crate) fn with_retry<T, F>(config: &RetryConfig, mut operation: F) -> Result<T, PublishError>
where
    F: FnMut() -> Result<T, PublishError>,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;

        match operation() {
            Ok(result) => return Ok(result),
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) if attempt >= config.max_attempts => return Err(e),
            Err(e) => {
                tracing::warn!(
                    "transient publish failure (attempt {}/{}): {}; retrying in {:?}",
                    attempt,
                    config.max_attempts,
                    e,
                    delay
                );

                thread::sleep(delay);
                delay = (delay * 2).min(config.max_delay);
            }
        }
    }
}
