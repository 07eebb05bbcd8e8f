//! Resource store client abstraction.
//!
//! Operations talk to the cluster through [`StoreClient`], which keeps the
//! engine testable without a live API server. [`InMemoryStore`] is a
//! complete implementation backed by a map, used by the test suites and by
//! embedders that want a dry-run store.

mod memory;

use std::future::Future;
use std::pin::Pin;

use crate::error::ClientError;
use crate::resource::{ObjectKey, Resource};

pub use memory::InMemoryStore;

/// A boxed future for async trait methods.
///
/// This type alias enables `mockall::automock` compatibility and trait
/// object usage for async methods in [`StoreClient`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Get, create and delete primitives against a remote store.
///
/// Futures must be cancel-safe: the engine drops an in-flight call when its
/// cancellation token fires.
#[cfg_attr(test, mockall::automock)]
pub trait StoreClient: Send + Sync {
    /// Fetch the object identified by `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] when no such object exists, or
    /// another [`ClientError`] when the request fails.
    fn get(&self, key: &ObjectKey) -> BoxFuture<'_, Result<Resource, ClientError>>;

    /// Create `resource` in the store.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::AlreadyExists`] when the identity is taken,
    /// or another [`ClientError`] when the request fails.
    fn create(&self, resource: &Resource) -> BoxFuture<'_, Result<(), ClientError>>;

    /// Delete the object identified by `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] when no such object exists, or
    /// another [`ClientError`] when the request fails.
    fn delete(&self, key: &ObjectKey) -> BoxFuture<'_, Result<(), ClientError>>;
}
