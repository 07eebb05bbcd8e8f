//! Map-backed store used for dry runs and tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{BoxFuture, StoreClient};
use crate::error::{ClientError, ExpressionError};
use crate::resource::{ObjectKey, ObjectSelector, Resource};

/// A store that keeps resources in memory, keyed by identity.
///
/// Enforces identity uniqueness on create the way an API server does.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    objects: Mutex<BTreeMap<ObjectKey, Resource>>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `resources`.
    #[must_use]
    pub fn with_resources(resources: impl IntoIterator<Item = Resource>) -> Self {
        let objects = resources
            .into_iter()
            .map(|resource| (resource.key(), resource))
            .collect();
        Self {
            objects: Mutex::new(objects),
        }
    }

    /// Returns whether an object with `key` is stored.
    #[must_use]
    pub fn contains(&self, key: &ObjectKey) -> bool {
        self.lock().contains_key(key)
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// List objects of one `apiVersion` and kind that satisfy `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`ExpressionError::Syntax`] when the label selector is
    /// malformed.
    pub fn list(
        &self,
        api_version: &str,
        kind: &str,
        selector: &ObjectSelector,
    ) -> Result<Vec<Resource>, ExpressionError> {
        let objects = self.lock();
        let mut selected = Vec::new();
        for resource in objects
            .values()
            .filter(|resource| resource.api_version() == api_version && resource.kind() == kind)
        {
            if selector.matches(resource)? {
                selected.push(resource.clone());
            }
        }
        Ok(selected)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<ObjectKey, Resource>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StoreClient for InMemoryStore {
    fn get(&self, key: &ObjectKey) -> BoxFuture<'_, Result<Resource, ClientError>> {
        let key = key.clone();
        Box::pin(async move {
            let found = self.lock().get(&key).cloned();
            found.ok_or(ClientError::NotFound { key })
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, Result<(), ClientError>> {
        let resource = resource.clone();
        Box::pin(async move {
            let key = resource.key();
            let mut objects = self.lock();
            if objects.contains_key(&key) {
                return Err(ClientError::AlreadyExists { key });
            }
            objects.insert(key, resource);
            Ok(())
        })
    }

    fn delete(&self, key: &ObjectKey) -> BoxFuture<'_, Result<(), ClientError>> {
        let key = key.clone();
        Box::pin(async move {
            let removed = self.lock().remove(&key);
            removed.map(|_| ()).ok_or(ClientError::NotFound { key })
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;

    fn config_map(name: &str, app: &str) -> Resource {
        Resource::from_value(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": { "name": name, "namespace": "default", "labels": { "app": app } }
        }))
        .expect("fixture resource should be valid")
    }

    #[fixture]
    fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
        tokio::runtime::Runtime::new()
    }

    #[rstest]
    fn create_then_get_round_trips(
        runtime: std::io::Result<tokio::runtime::Runtime>,
    ) -> std::io::Result<()> {
        let rt = runtime?;
        let store = InMemoryStore::new();
        let resource = config_map("settings", "web");

        rt.block_on(store.create(&resource))
            .map_err(std::io::Error::other)?;
        let fetched = rt
            .block_on(store.get(&resource.key()))
            .map_err(std::io::Error::other)?;

        assert_eq!(fetched, resource);
        assert_eq!(store.len(), 1);
        Ok(())
    }

    #[rstest]
    fn duplicate_create_is_rejected(
        runtime: std::io::Result<tokio::runtime::Runtime>,
    ) -> std::io::Result<()> {
        let rt = runtime?;
        let resource = config_map("settings", "web");
        let store = InMemoryStore::with_resources([resource.clone()]);

        let outcome = rt.block_on(store.create(&resource));

        assert_eq!(
            outcome,
            Err(ClientError::AlreadyExists {
                key: resource.key()
            })
        );
        Ok(())
    }

    #[rstest]
    fn get_and_delete_report_not_found(
        runtime: std::io::Result<tokio::runtime::Runtime>,
    ) -> std::io::Result<()> {
        let rt = runtime?;
        let store = InMemoryStore::new();
        let key = config_map("missing", "web").key();

        let fetched = rt.block_on(store.get(&key));
        let deleted = rt.block_on(store.delete(&key));

        assert!(fetched.is_err_and(|error| error.is_not_found()));
        assert!(deleted.is_err_and(|error| error.is_not_found()));
        Ok(())
    }

    #[rstest]
    fn dropped_futures_leave_the_store_untouched() {
        let existing = config_map("settings", "web");
        let store = InMemoryStore::with_resources([existing.clone()]);
        let fresh = config_map("other", "web");

        drop(store.delete(&existing.key()));
        drop(store.create(&fresh));

        assert!(store.contains(&existing.key()));
        assert!(!store.contains(&fresh.key()));
        assert_eq!(store.len(), 1);
    }

    #[rstest]
    fn list_filters_by_kind_and_selector() {
        let store = InMemoryStore::with_resources([
            config_map("web-settings", "web"),
            config_map("api-settings", "api"),
        ]);
        let selector = ObjectSelector {
            selector: Some(String::from("app=web")),
            ..ObjectSelector::default()
        };

        let selected = store
            .list("v1", "ConfigMap", &selector)
            .expect("selector should parse");
        let names: Vec<&str> = selected.iter().map(Resource::name).collect();

        assert_eq!(names, vec!["web-settings"]);
        assert!(
            store
                .list("v1", "Secret", &ObjectSelector::default())
                .expect("empty selector should parse")
                .is_empty()
        );
    }
}
