//! Job Polling Task
//!
//! Some upstream operations (video rendering, for instance) start a job and
//! must be polled until it completes. This bounds that loop with an overall
//! deadline and a cancellation token.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

// == Poll Error ==
#[derive(Error, Debug)]
pub enum PollError {
    /// The job did not complete before the deadline
    #[error("Job not ready after {0:?}")]
    TimedOut(Duration),

    /// The cancellation token fired
    #[error("Polling cancelled")]
    Cancelled,

    /// A status check failed; the original error stays in the source chain
    #[error("{0}")]
    Check(#[from] anyhow::Error),
}

/// Calls `check` every `interval` until it yields `Some`, the `deadline`
/// elapses or `cancel` fires. The first check runs immediately.
///
/// A failing check ends polling right away with its error, so a rate-limit
/// message from the status endpoint still reaches the classifier intact.
pub async fn poll_until_ready<R, F, Fut>(
    interval: Duration,
    deadline: Duration,
    cancel: &CancellationToken,
    check: F,
) -> Result<R, PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<Option<R>>>,
{
    poll_until_ready_with_progress(interval, deadline, cancel, |_| {}, check).await
}

/// Like [`poll_until_ready`], calling `on_attempt` with the 1-based attempt
/// number right before each check.
pub async fn poll_until_ready_with_progress<R, P, F, Fut>(
    interval: Duration,
    deadline: Duration,
    cancel: &CancellationToken,
    mut on_attempt: P,
    mut check: F,
) -> Result<R, PollError>
where
    P: FnMut(u32),
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<Option<R>>>,
{
    let poll_loop = async {
        let mut ticker = time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut attempt: u32 = 0;

        loop {
            ticker.tick().await;
            attempt += 1;
            on_attempt(attempt);

            match check().await {
                Ok(Some(ready)) => {
                    debug!(attempt, "job ready");
                    return Ok(ready);
                }
                Ok(None) => debug!(attempt, "job pending, next check in {:?}", interval),
                Err(err) => return Err(PollError::Check(err)),
            }
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PollError::Cancelled),
        outcome = time::timeout(deadline, poll_loop) => match outcome {
            Ok(result) => result,
            Err(_) => Err(PollError::TimedOut(deadline)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::{ErrorClassifier, FailureKind, MalformedResponse, TextMatchClassifier};
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_returns_when_job_completes() {
        let checks = Arc::new(AtomicU32::new(0));
        let counter = checks.clone();

        let uri = poll_until_ready(
            Duration::from_millis(5),
            Duration::from_secs(5),
            &CancellationToken::new(),
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Ok((n >= 3).then(|| "video://done".to_string())) }
            },
        )
        .await
        .unwrap();

        assert_eq!(uri, "video://done");
        assert_eq!(checks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_times_out_when_job_never_completes() {
        let err = poll_until_ready(
            Duration::from_millis(5),
            Duration::from_millis(50),
            &CancellationToken::new(),
            || async { Ok(None::<()>) },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PollError::TimedOut(d) if d == Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn test_cancel_stops_polling() {
        let token = CancellationToken::new();
        token.cancel();

        let err = poll_until_ready(
            Duration::from_millis(5),
            Duration::from_secs(5),
            &token,
            || async { Ok(None::<()>) },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PollError::Cancelled));
    }

    #[tokio::test]
    async fn test_check_error_passes_through() {
        let err = poll_until_ready(
            Duration::from_millis(5),
            Duration::from_secs(5),
            &CancellationToken::new(),
            || async { Err::<Option<()>, _>(anyhow!("429 Too Many Requests")) },
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "429 Too Many Requests");
    }

    #[tokio::test]
    async fn test_check_error_stays_in_source_chain() {
        let err = poll_until_ready(
            Duration::from_millis(5),
            Duration::from_secs(5),
            &CancellationToken::new(),
            || async {
                Err::<Option<()>, _>(anyhow::Error::new(MalformedResponse::new(
                    "expected value at line 1",
                )))
            },
        )
        .await
        .unwrap_err();

        let failure = anyhow::Error::new(err);
        assert!(failure.chain().any(|cause| cause.is::<MalformedResponse>()));
        assert_eq!(
            TextMatchClassifier::default().classify(&failure),
            FailureKind::Malformed
        );
    }

    #[tokio::test]
    async fn test_progress_reported_per_attempt() {
        let mut seen = Vec::new();

        let ready = poll_until_ready_with_progress(
            Duration::from_millis(5),
            Duration::from_secs(5),
            &CancellationToken::new(),
            |attempt| seen.push(attempt),
            {
                let mut remaining = 2;
                move || {
                    remaining -= 1;
                    let done = remaining < 0;
                    async move { Ok(done.then_some("frames")) }
                }
            },
        )
        .await
        .unwrap();

        assert_eq!(ready, "frames");
        assert_eq!(seen, vec![1, 2, 3]);
    }
}
