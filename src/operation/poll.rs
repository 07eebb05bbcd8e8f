//! Cancellation-aware retry loop shared by operations.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::OperationError;

/// What one attempt decided.
#[derive(Debug)]
pub(crate) enum Attempt<T> {
    /// The attempt succeeded; stop polling.
    Done(T),
    /// The attempt failed but a later one may succeed.
    Retry(OperationError),
    /// The attempt failed in a way no retry can fix.
    Abort(OperationError),
}

/// Run `attempt` every `interval` until it completes or `token` fires.
///
/// The first attempt starts immediately. Cancellation interrupts both an
/// in-flight attempt and the wait between attempts, and yields the last
/// retryable error or [`OperationError::Cancelled`] if none was observed.
pub(crate) async fn poll_until_cancelled<T, F, Fut>(
    token: &CancellationToken,
    interval: Duration,
    mut attempt: F,
) -> Result<T, OperationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    let mut last_error = None;
    let mut attempts: u64 = 0;
    loop {
        attempts += 1;
        let outcome = tokio::select! {
            biased;
            () = token.cancelled() => return Err(last_error.unwrap_or(OperationError::Cancelled)),
            outcome = attempt() => outcome,
        };
        match outcome {
            Attempt::Done(value) => return Ok(value),
            Attempt::Abort(error) => return Err(error),
            Attempt::Retry(error) => {
                debug!(attempts, error = %error, "attempt failed, retrying");
                last_error = Some(error);
            }
        }
        tokio::select! {
            biased;
            () = token.cancelled() => return Err(last_error.unwrap_or(OperationError::Cancelled)),
            () = tokio::time::sleep(interval) => {}
        }
    }
}
