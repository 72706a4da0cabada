//! # Retry with Backoff
//!
//! Retries idempotent reads (catalog, customers, ledger history) on
//! transport failures.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BACKOFF STRATEGY (Exponential with Jitter)                             │
//! │  ───────────────────────────────────────────                            │
//! │  Attempt 1: immediately                                                 │
//! │  Attempt 2: ~500ms                                                      │
//! │  Attempt 3: ~1s                                                         │
//! │  Attempt 4: ~2s  ... capped at max_backoff                              │
//! │                                                                         │
//! │  Stops at the first non-retryable error or after max_retries.           │
//! │  NEVER used for sale commits.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use std::future::Future;
use tracing::{debug, warn};

use crate::config::RetrySettings;
use crate::error::ClientResult;

fn create_backoff(settings: &RetrySettings) -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: settings.initial_backoff(),
        max_interval: settings.max_backoff(),
        multiplier: 2.0,
        max_elapsed_time: None,
        ..Default::default()
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or runs
/// out of retries.
pub async fn with_backoff<T, F, Fut>(
    settings: &RetrySettings,
    operation: &str,
    mut op: F,
) -> ClientResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ClientResult<T>>,
{
    let mut backoff = create_backoff(settings);
    let mut retry_count = 0u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && retry_count < settings.max_retries => {
                retry_count += 1;
                let Some(duration) = backoff.next_backoff() else {
                    return Err(e);
                };
                warn!(
                    operation,
                    error = %e,
                    attempt = retry_count,
                    ?duration,
                    "Retrying after failure"
                );
                tokio::time::sleep(duration).await;
            }
            Err(e) => {
                debug!(operation, error = %e, retries = retry_count, "Giving up");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn settings(max_retries: u32) -> RetrySettings {
        RetrySettings {
            max_retries,
            initial_backoff_ms: 10,
            max_backoff_secs: 1,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transport_failures_until_success() {
        let calls = Arc::new(AtomicU32::new(0));

        let result = with_backoff(&settings(3), "fetch_inventory", || {
            let calls = calls.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ClientError::ConnectionFailed("refused".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));

        let result: ClientResult<()> = with_backoff(&settings(2), "fetch_customers", || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ClientError::Timeout("slow".into()))
            }
        })
        .await;

        assert!(matches!(result, Err(ClientError::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_fails_immediately() {
        let calls = Arc::new(AtomicU32::new(0));

        let result: ClientResult<()> = with_backoff(&settings(5), "fetch_inventory", || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ClientError::Unauthorized)
            }
        })
        .await;

        assert!(matches!(result, Err(ClientError::Unauthorized)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
