//! Bounded retry with exponential backoff and jitter.
//!
//! Only [`UpstreamError::RateLimited`] is retried; every other error
//! propagates immediately. Delays are cooperative `tokio::time::sleep`s, so
//! the invoker never blocks a runtime thread and paused-clock tests advance
//! through the schedule instantly.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use super::UpstreamError;

/// Base delay before the first retry; doubles each attempt.
const BASE_DELAY_MS: u64 = 1_000;

/// Upper bound (exclusive) of the uniform jitter added to each delay.
const MAX_JITTER_MS: u64 = 1_000;

/// Delay before the retry that follows 0-indexed `attempt`:
/// `2^attempt * 1000ms + uniform(0..1000ms)`.
///
/// The jitter spreads concurrent retries so they do not slam the same rate
/// limit in lockstep.
pub(crate) fn backoff_delay(attempt: u32) -> Duration {
    let base = BASE_DELAY_MS.saturating_mul(1u64 << attempt.min(16));
    let jitter = rand::rng().random_range(0..MAX_JITTER_MS);
    Duration::from_millis(base + jitter)
}

/// Runs `operation` up to `max_attempts` times, sleeping between attempts
/// that failed with a rate-limit signal.
///
/// After the final attempt fails, the original rate-limit error is returned
/// intact so the caller's fallback logic can engage. `max_attempts` is
/// clamped to at least 1.
pub async fn with_backoff<T, F, Fut>(
    max_attempts: u32,
    mut operation: F,
) -> Result<T, UpstreamError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt + 1 < max_attempts => {
                let delay = backoff_delay(attempt);
                let hint = match &err {
                    UpstreamError::RateLimited { retry_after_hint } => *retry_after_hint,
                    _ => None,
                };
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    retry_after_hint = ?hint,
                    "rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
