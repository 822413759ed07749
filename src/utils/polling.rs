use crate::errors::{BrowserError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Polls `condition` until it yields `true`. Errors from the condition end
/// the wait immediately; running out of time fails with `message`.
pub async fn wait_until<F, Fut>(
    mut condition: F,
    timeout: Duration,
    poll_interval: Duration,
    message: &str,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if condition().await? {
            return Ok(());
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(BrowserError::Timeout(message.to_string()));
        }
        tokio::time::sleep(poll_interval.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn returns_once_condition_holds() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        wait_until(
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move { Ok(n >= 2) }
            },
            Duration::from_secs(5),
            Duration::from_millis(500),
            "never",
        )
        .await
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_with_the_given_message() {
        let err = wait_until(
            || async { Ok(false) },
            Duration::from_secs(5),
            Duration::from_millis(500),
            "Ready state is not complete.",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, BrowserError::Timeout(ref m) if m == "Ready state is not complete."));
    }

    #[tokio::test]
    async fn condition_errors_propagate() {
        let err = wait_until(
            || async { Err(BrowserError::JavaScriptFailed("boom".into())) },
            Duration::from_secs(5),
            Duration::from_millis(500),
            "unused",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, BrowserError::JavaScriptFailed(_)));
    }
}
