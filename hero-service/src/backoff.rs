//! Exponential backoff for startup connections

use std::future::Future;
use std::time::Duration;

/// Retry `attempt` until it succeeds or `max_retries` retries have failed
///
/// The n-th retry waits `base_delay * 2^(n-1)`. `what` names the resource in logs.
pub(crate) async fn retry_with_backoff<T, E, F, Fut>(
    what: &str,
    max_retries: u32,
    base_delay: Duration,
    mut attempt: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut failures = 0_u32;
    loop {
        match attempt().await {
            Ok(value) => {
                if failures > 0 {
                    tracing::info!("{} connection established after {} attempt(s)", what, failures + 1);
                }
                return Ok(value);
            }
            Err(e) => {
                failures += 1;
                if failures > max_retries {
                    tracing::error!(
                        "Failed to connect to {} after {} attempts: {}",
                        what,
                        failures,
                        e
                    );
                    return Err(e);
                }

                let delay = base_delay.saturating_mul(2_u32.saturating_pow(failures - 1));
                tracing::warn!(
                    "{} connection attempt {} failed: {}. Retrying in {:?}...",
                    what,
                    failures,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = &AtomicU32::new(0);
        let result: Result<u32, String> = retry_with_backoff("test", 3, Duration::ZERO, move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(format!("failure {}", n))
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), String> = retry_with_backoff("test", 2, Duration::ZERO, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("down".to_string())
        })
        .await;
        assert_eq!(result, Err("down".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
