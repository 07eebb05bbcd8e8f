//! Declarative operations and the engine that retries them.
//!
//! An [`Operation`] performs one test step against the store. Execution is
//! a poll loop: each attempt observes the store, reclassifies the outcome
//! through the step's expectations and, on success, extracts outputs. The
//! loop has no attempt cap; the caller bounds it with a cancellation token,
//! typically through a [`Deadline`].

mod create;
mod logging;
mod poll;
mod timeout;

use std::fmt;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::bindings::Bindings;
use crate::error::OperationError;
use crate::output::Outputs;

pub use crate::client::BoxFuture;
pub use create::CreateOperation;
pub use timeout::{Deadline, Timeouts};

/// Interval between two attempts of the same operation.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// The kind of an operation, used to pick its timeout budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum OperationKind {
    /// Create a resource that must not exist yet.
    Create,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
        }
    }
}

/// A single declarative test step.
pub trait Operation: Send + Sync {
    /// The operation's kind.
    fn kind(&self) -> OperationKind;

    /// Run the operation until it succeeds, fails terminally or `token` is
    /// cancelled.
    ///
    /// `None` bindings behave like an empty chain. On success the produced
    /// outputs are returned; the caller decides whether to register them
    /// for later steps.
    ///
    /// # Errors
    ///
    /// Returns the terminal error, or the last attempt's error when `token`
    /// is cancelled. [`OperationError::Cancelled`] is returned when no
    /// attempt completed.
    fn exec<'a>(
        &'a self,
        token: &'a CancellationToken,
        bindings: Option<Bindings>,
    ) -> BoxFuture<'a, Result<Outputs, OperationError>>;
}
