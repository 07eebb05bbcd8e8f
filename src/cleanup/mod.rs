//! Cleanup obligations for resources created during a test.
//!
//! An operation records an obligation as soon as the store accepts a
//! resource, before any expectation or output runs, so a later failure in
//! the same step cannot leak the object.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::StoreClient;
use crate::error::CleanupError;
use crate::resource::{ObjectKey, Resource};

/// Records obligations to delete created resources at teardown.
pub trait Cleaner: Send + Sync {
    /// Remember that `resource` was created through `client`.
    fn record(&self, resource: Resource, client: Arc<dyn StoreClient>);
}

impl<F> Cleaner for F
where
    F: Fn(Resource, Arc<dyn StoreClient>) + Send + Sync,
{
    fn record(&self, resource: Resource, client: Arc<dyn StoreClient>) {
        self(resource, client);
    }
}

struct Obligation {
    key: ObjectKey,
    client: Arc<dyn StoreClient>,
}

/// A cleaner that keeps obligations and deletes them on teardown.
#[derive(Default)]
pub struct CleanupRegistry {
    obligations: Mutex<Vec<Obligation>>,
}

impl CleanupRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of outstanding obligations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns whether no obligation is outstanding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Identities of outstanding obligations, oldest first.
    #[must_use]
    pub fn keys(&self) -> Vec<ObjectKey> {
        self.lock()
            .iter()
            .map(|obligation| obligation.key.clone())
            .collect()
    }

    /// Delete every recorded resource, newest first.
    ///
    /// Objects that are already gone count as cleaned. Other failures do not
    /// stop the teardown; they are reported together once every obligation
    /// has been attempted. Returns the number of objects deleted.
    ///
    /// Obligations that failed or were never attempted stay in the registry,
    /// so a later teardown retries them.
    ///
    /// # Errors
    ///
    /// Returns [`CleanupError::Failed`] when any deletion failed and
    /// [`CleanupError::Cancelled`] when `token` fires first.
    pub async fn teardown(&self, token: &CancellationToken) -> Result<usize, CleanupError> {
        let mut pending = std::mem::take(&mut *self.lock());
        let mut deleted = 0;
        let mut failed = Vec::new();
        let mut failures = Vec::new();

        while let Some(obligation) = pending.pop() {
            let attempted = if token.is_cancelled() {
                None
            } else {
                tokio::select! {
                    biased;
                    () = token.cancelled() => None,
                    result = obligation.client.delete(&obligation.key) => Some(result),
                }
            };
            let Some(outcome) = attempted else {
                pending.push(obligation);
                let remaining = pending.len();
                warn!(remaining, "cleanup cancelled");
                self.restore(pending, failed);
                return Err(CleanupError::Cancelled { remaining });
            };
            match outcome {
                Ok(()) => {
                    info!(object = %obligation.key, "deleted resource");
                    deleted += 1;
                }
                Err(error) if error.is_not_found() => {
                    debug!(object = %obligation.key, "resource already deleted");
                }
                Err(error) => {
                    warn!(object = %obligation.key, error = %error, "failed to delete resource");
                    failures.push(format!("{}: {error}", obligation.key));
                    failed.push(obligation);
                }
            }
        }

        if failures.is_empty() {
            Ok(deleted)
        } else {
            self.restore(pending, failed);
            Err(CleanupError::Failed { failures })
        }
    }

    /// Put back unattempted and failed obligations ahead of any recorded
    /// while teardown ran. `failed` is in attempt order, newest first.
    fn restore(&self, mut unattempted: Vec<Obligation>, failed: Vec<Obligation>) {
        unattempted.extend(failed.into_iter().rev());
        let mut obligations = self.lock();
        let recorded_meanwhile = std::mem::take(&mut *obligations);
        *obligations = unattempted;
        obligations.extend(recorded_meanwhile);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Obligation>> {
        self.obligations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Cleaner for CleanupRegistry {
    fn record(&self, resource: Resource, client: Arc<dyn StoreClient>) {
        let key = resource.key();
        debug!(object = %key, "recorded cleanup obligation");
        self.lock().push(Obligation { key, client });
    }
}
