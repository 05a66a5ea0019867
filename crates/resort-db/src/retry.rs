//! # Bounded Retry
//!
//! Reruns an operation whose transaction lost a version race or hit a
//! locked database.
//!
//! ```text
//! attempt 1 ──► ConcurrentModification ──► sleep 1×backoff
//! attempt 2 ──► ConcurrentModification ──► sleep 2×backoff
//! attempt 3 ──► ConcurrentModification ──► surfaced to caller
//! ```
//!
//! Each attempt opens a fresh transaction, so it re-reads rows and
//! re-validates state. Any other error kind is returned on first sight.

use resort_core::EngineConfig;
use std::future::Future;
use tracing::warn;

use crate::error::OpsResult;

/// Runs `op` up to `config.max_attempts` times while it fails with a
/// retryable error.
pub async fn with_retry<T, F, Fut>(
    config: &EngineConfig,
    operation: &str,
    mut op: F,
) -> OpsResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = OpsResult<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                warn!(
                    operation,
                    attempt,
                    max_attempts,
                    entity_id = err.entity_id().unwrap_or("-"),
                    "Concurrent modification, retrying"
                );
                tokio::time::sleep(config.backoff(attempt)).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OpsError;
    use resort_core::CoreError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config() -> EngineConfig {
        EngineConfig {
            retry_backoff_ms: 0,
            ..EngineConfig::default()
        }
    }

    #[tokio::test]
    async fn test_retries_contention_then_succeeds() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = with_retry(&fast_config(), "test", move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(OpsError::concurrent("Room", "r1"))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: OpsResult<()> = with_retry(&fast_config(), "test", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(OpsError::concurrent("Room", "r1"))
        })
        .await;

        assert!(result.unwrap_err().is_retryable());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_terminal_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: OpsResult<()> = with_retry(&fast_config(), "test", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(OpsError::Domain(CoreError::VoucherNotFound {
                code: "NOPE".into(),
            }))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
