//! Per-kind time budgets and the deadline that enforces them.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::OperationKind;

/// Time budgets per operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Budget for apply and create operations.
    pub apply: Duration,
    /// Budget for assert operations.
    pub assert: Duration,
    /// Budget for cleanup at teardown.
    pub cleanup: Duration,
    /// Budget for delete operations.
    pub delete: Duration,
    /// Budget for error operations.
    pub error: Duration,
    /// Budget for script and command operations.
    pub exec: Duration,
}

impl Timeouts {
    /// The budget for operations of `kind`.
    #[must_use]
    pub const fn for_kind(&self, kind: OperationKind) -> Duration {
        match kind {
            OperationKind::Create => self.apply,
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            apply: Duration::from_secs(5),
            assert: Duration::from_secs(30),
            cleanup: Duration::from_secs(30),
            delete: Duration::from_secs(15),
            error: Duration::from_secs(30),
            exec: Duration::from_secs(5),
        }
    }
}

/// A child cancellation scope that expires after a fixed duration.
///
/// Cancelling the parent cancels the deadline's token too. Expiry cancels
/// only the child, so sibling work under the same parent is unaffected.
#[derive(Debug)]
pub struct Deadline {
    token: CancellationToken,
    timeout: Duration,
}

impl Deadline {
    /// Create a deadline of `timeout` below `parent`.
    #[must_use]
    pub fn new(parent: &CancellationToken, timeout: Duration) -> Self {
        Self {
            token: parent.child_token(),
            timeout,
        }
    }

    /// The token to hand to the work bounded by this deadline.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The configured duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Drive `future` to completion, cancelling the token on expiry.
    ///
    /// The future is not dropped when the deadline passes: it observes the
    /// cancellation and finishes with its own result, so an operation can
    /// still report the last error it saw.
    pub async fn run<F: Future>(&self, future: F) -> F::Output {
        tokio::pin!(future);
        tokio::select! {
            output = &mut future => output,
            () = tokio::time::sleep(self.timeout) => {
                self.token.cancel();
                future.await
            }
        }
    }
}
