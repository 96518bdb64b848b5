//! Wait Mechanisms
//!
//! Condition-based synchronization with the live page. Instead of sleeping a
//! fixed amount after an interaction, callers poll a readout until it shows
//! the expected value or the timeout expires.

use crate::result::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for the UI to settle after an interaction (5 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a successful wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitResult<T> {
    /// The value produced by the satisfied probe
    pub value: T,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of probes performed
    pub polls: u32,
}

// =============================================================================
// POLLING
// =============================================================================

/// Poll `probe` until it yields `Some`, or fail with [`StoreError::Timeout`].
///
/// The probe always runs at least once, even with a zero timeout. Errors from
/// the probe abort the wait immediately.
///
/// # Errors
///
/// Returns the probe's error, or `Timeout` if the condition never holds.
pub async fn wait_for<T, F, Fut>(
    options: &WaitOptions,
    waited_for: &str,
    mut probe: F,
) -> StoreResult<WaitResult<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<Option<T>>>,
{
    let start = Instant::now();
    let mut polls = 0;

    loop {
        polls += 1;
        if let Some(value) = probe().await? {
            let elapsed = start.elapsed();
            tracing::trace!(waited_for, polls, ?elapsed, "condition satisfied");
            return Ok(WaitResult {
                value,
                elapsed,
                polls,
            });
        }
        if start.elapsed() >= options.timeout() {
            return Err(StoreError::Timeout {
                ms: options.timeout_ms,
                waited_for: waited_for.to_string(),
            });
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

/// Poll a boolean condition until it holds.
///
/// # Errors
///
/// Returns the probe's error, or `Timeout` if the condition never holds.
pub async fn wait_until<F, Fut>(
    options: &WaitOptions,
    waited_for: &str,
    mut probe: F,
) -> StoreResult<WaitResult<()>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<bool>>,
{
    wait_for(options, waited_for, || {
        let fut = probe();
        async move { Ok(fut.await?.then_some(())) }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_options_builder() {
        let opts = WaitOptions::new().with_timeout(250).with_poll_interval(10);
        assert_eq!(opts.timeout(), Duration::from_millis(250));
        assert_eq!(opts.poll_interval(), Duration::from_millis(10));
        assert_eq!(WaitOptions::default().timeout_ms, DEFAULT_WAIT_TIMEOUT_MS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_eventually_succeeds() {
        let calls = AtomicU32::new(0);
        let result = wait_for(&WaitOptions::default(), "third poll", || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok((n >= 3).then_some(n)) }
        })
        .await
        .unwrap();

        assert_eq!(result.value, 3);
        assert_eq!(result.polls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_times_out() {
        let opts = WaitOptions::new().with_timeout(200).with_poll_interval(50);
        let err = wait_until(&opts, "never", || async { Ok(false) })
            .await
            .unwrap_err();

        match err {
            StoreError::Timeout { ms, waited_for } => {
                assert_eq!(ms, 200);
                assert_eq!(waited_for, "never");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_still_probes_once() {
        let calls = AtomicU32::new(0);
        let opts = WaitOptions::new().with_timeout(0);
        let result = wait_until(&opts, "immediate", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(true) }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_probe_error_aborts() {
        let err = wait_until(&WaitOptions::default(), "bad probe", || async {
            Err(StoreError::parse("quantity", "??"))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }
}
