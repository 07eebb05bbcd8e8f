//! Immutable chains of named values.
//!
//! A [`Bindings`] value is a persistent singly linked list: registering a
//! name allocates one node pointing at the previous chain, so every earlier
//! view stays observably unchanged and clones are reference-count bumps.
//! Concurrent steps can extend a shared ancestor independently without
//! locks.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// A named value visible to template and expression evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    value: Value,
}

impl Binding {
    /// Wrap a JSON value.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self { value }
    }

    /// The absent marker, bound as JSON `null`.
    #[must_use]
    pub const fn null() -> Self {
        Self { value: Value::Null }
    }

    /// Borrow the bound value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Consume the binding and return its value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }
}

impl From<Value> for Binding {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

#[derive(Debug)]
struct Node {
    name: String,
    binding: Binding,
    parent: Option<Arc<Node>>,
}

impl Drop for Node {
    // Unlink uniquely owned ancestors one at a time so long chains never
    // recurse. The walk stops at the first ancestor another view still holds.
    fn drop(&mut self) {
        let mut next = self.parent.take();
        while let Some(node) = next {
            next = Arc::try_unwrap(node)
                .ok()
                .and_then(|mut unique| unique.parent.take());
        }
    }
}

/// An immutable, append-only chain of bindings.
#[derive(Clone, Default)]
pub struct Bindings {
    head: Option<Arc<Node>>,
}

impl Bindings {
    /// Create an empty chain.
    #[must_use]
    pub const fn new() -> Self {
        Self { head: None }
    }

    /// Return a new chain with `name` bound to `binding`.
    ///
    /// `self` is left untouched. A later registration shadows an earlier one
    /// with the same name.
    #[must_use]
    pub fn register(&self, name: impl Into<String>, binding: Binding) -> Self {
        Self {
            head: Some(Arc::new(Node {
                name: name.into(),
                binding,
                parent: self.head.clone(),
            })),
        }
    }

    /// Look up the newest binding registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.nodes()
            .find(|node| node.name == name)
            .map(|node| &node.binding)
    }

    /// Returns whether `name` resolves in this chain.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns whether nothing has been registered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Number of registrations, shadowed entries included.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.nodes().count()
    }

    /// Iterate `(name, binding)` pairs from newest to oldest.
    ///
    /// Shadowed entries are yielded too; use [`Self::get`] for resolution.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.nodes().map(|node| (node.name.as_str(), &node.binding))
    }

    fn nodes(&self) -> impl Iterator<Item = &Node> {
        std::iter::successors(self.head.as_deref(), |node| node.parent.as_deref())
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|(name, binding)| (name, binding.value())))
            .finish()
    }
}
