//! Namespace assignment for resources that do not declare one.

use std::collections::BTreeSet;

use crate::error::NamespaceError;
use crate::resource::Resource;

/// Kinds that never live in a namespace.
pub const CLUSTER_SCOPED_KINDS: [&str; 7] = [
    "Namespace",
    "Node",
    "PersistentVolume",
    "ClusterRole",
    "ClusterRoleBinding",
    "CustomResourceDefinition",
    "StorageClass",
];

const MAX_LABEL_LEN: usize = 63;

/// Assigns a namespace to resources before they are submitted.
#[cfg_attr(test, mockall::automock)]
pub trait Namespacer: Send + Sync {
    /// The namespace this policy assigns.
    fn namespace(&self) -> &str;

    /// Set the namespace on `resource` where the policy requires one.
    ///
    /// # Errors
    ///
    /// Returns a [`NamespaceError`] when `resource` conflicts with the
    /// policy.
    fn apply(&self, resource: &mut Resource) -> Result<(), NamespaceError>;
}

/// Fills in a fixed namespace and leaves cluster-scoped kinds alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultNamespacer {
    namespace: String,
    cluster_scoped: BTreeSet<String>,
}

impl DefaultNamespacer {
    /// Create a namespacer for `namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`NamespaceError::InvalidNamespace`] unless `namespace` is a
    /// valid RFC 1123 label.
    pub fn new(namespace: impl Into<String>) -> Result<Self, NamespaceError> {
        let label: String = namespace.into();
        validate_label(&label)?;
        Ok(Self {
            namespace: label,
            cluster_scoped: CLUSTER_SCOPED_KINDS.iter().map(|kind| String::from(*kind)).collect(),
        })
    }

    /// Treat `kind` as cluster scoped in addition to the built-in list.
    #[must_use]
    pub fn with_cluster_scoped(mut self, kind: impl Into<String>) -> Self {
        self.cluster_scoped.insert(kind.into());
        self
    }

    /// Returns whether resources of `kind` are cluster scoped.
    #[must_use]
    pub fn is_cluster_scoped(&self, kind: &str) -> bool {
        self.cluster_scoped.contains(kind)
    }
}

impl Namespacer for DefaultNamespacer {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn apply(&self, resource: &mut Resource) -> Result<(), NamespaceError> {
        if self.is_cluster_scoped(resource.kind()) {
            return resource.namespace().map_or(Ok(()), |namespace| {
                Err(NamespaceError::ClusterScoped {
                    kind: String::from(resource.kind()),
                    namespace: String::from(namespace),
                })
            });
        }
        if resource.namespace().is_none() {
            resource.set_namespace(&self.namespace);
        }
        Ok(())
    }
}

fn validate_label(namespace: &str) -> Result<(), NamespaceError> {
    let invalid = |reason: &str| NamespaceError::InvalidNamespace {
        namespace: String::from(namespace),
        reason: String::from(reason),
    };
    if namespace.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if namespace.len() > MAX_LABEL_LEN {
        return Err(invalid("must be at most 63 characters"));
    }
    if !namespace
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(invalid(
            "must consist of lower case alphanumeric characters or '-'",
        ));
    }
    if namespace.starts_with('-') || namespace.ends_with('-') {
        return Err(invalid("must start and end with an alphanumeric character"));
    }
    Ok(())
}
