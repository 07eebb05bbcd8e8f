//! Schema-less resource documents and their identities.
//!
//! A [`Resource`] is a JSON object describing the desired or observed state
//! of a cluster-managed object. Only the identity fields are interpreted:
//! `apiVersion`, `kind`, `metadata.name`, `metadata.namespace` and
//! `metadata.labels`. Everything else is carried through untouched.

mod selector;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ResourceError;

pub use selector::{LabelRequirement, ObjectSelector};

const API_VERSION: &str = "apiVersion";
const KIND: &str = "kind";
const METADATA: &str = "metadata";
const NAME: &str = "name";
const NAMESPACE: &str = "namespace";
const LABELS: &str = "labels";

/// Group, version and kind of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupVersionKind {
    /// API group; empty for the core group.
    pub group: String,
    /// API version within the group.
    pub version: String,
    /// Resource kind.
    pub kind: String,
}

impl GroupVersionKind {
    /// Split an `apiVersion` string and pair it with `kind`.
    ///
    /// `apps/v1` yields group `apps`; a bare `v1` yields the core group.
    #[must_use]
    pub fn from_api_version(api_version: &str, kind: &str) -> Self {
        let (group, version) = api_version
            .rsplit_once('/')
            .unwrap_or(("", api_version));
        Self {
            group: String::from(group),
            version: String::from(version),
            kind: String::from(kind),
        }
    }

    /// Reassemble the `apiVersion` string.
    #[must_use]
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

/// Identity of an object in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    api_version: String,
    kind: String,
    namespace: Option<String>,
    name: String,
}

impl ObjectKey {
    /// Build a key from its parts. An empty namespace is treated as none.
    #[must_use]
    pub fn new(api_version: &str, kind: &str, namespace: Option<&str>, name: &str) -> Self {
        Self {
            api_version: String::from(api_version),
            kind: String::from(kind),
            namespace: namespace
                .filter(|value| !value.is_empty())
                .map(String::from),
            name: String::from(name),
        }
    }

    /// The object's `apiVersion`.
    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// The object's kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The object's namespace, if namespaced.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The object's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/", self.kind)?;
        if let Some(namespace) = &self.namespace {
            write!(f, "{namespace}/")?;
        }
        f.write_str(&self.name)
    }
}

/// A validated resource document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Resource {
    content: Map<String, Value>,
}

impl Resource {
    /// Validate a JSON value as a resource document.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotAnObject`] for non-object values and
    /// [`ResourceError::MissingField`] when `apiVersion`, `kind` or
    /// `metadata.name` is absent, empty or not a string.
    pub fn from_value(value: Value) -> Result<Self, ResourceError> {
        let Value::Object(content) = value else {
            return Err(ResourceError::NotAnObject);
        };
        let resource = Self { content };
        require(API_VERSION, resource.top_level_str(API_VERSION))?;
        require(KIND, resource.top_level_str(KIND))?;
        require("metadata.name", resource.metadata_str(NAME))?;
        Ok(resource)
    }

    /// The document's `apiVersion`.
    #[must_use]
    pub fn api_version(&self) -> &str {
        self.top_level_str(API_VERSION).unwrap_or_default()
    }

    /// The document's kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.top_level_str(KIND).unwrap_or_default()
    }

    /// The document's `metadata.name`.
    #[must_use]
    pub fn name(&self) -> &str {
        self.metadata_str(NAME).unwrap_or_default()
    }

    /// The document's namespace; empty strings count as unset.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.metadata_str(NAMESPACE)
            .filter(|namespace| !namespace.is_empty())
    }

    /// Set `metadata.namespace`.
    pub fn set_namespace(&mut self, namespace: &str) {
        let metadata = self
            .content
            .entry(METADATA)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(fields) = metadata {
            fields.insert(String::from(NAMESPACE), Value::String(String::from(namespace)));
        }
    }

    /// String-valued entries of `metadata.labels`.
    #[must_use]
    pub fn labels(&self) -> BTreeMap<&str, &str> {
        self.content
            .get(METADATA)
            .and_then(|metadata| metadata.get(LABELS))
            .and_then(Value::as_object)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(|(key, value)| value.as_str().map(|text| (key.as_str(), text)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Group, version and kind.
    #[must_use]
    pub fn group_version_kind(&self) -> GroupVersionKind {
        GroupVersionKind::from_api_version(self.api_version(), self.kind())
    }

    /// Identity used to address the object in the store.
    #[must_use]
    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.api_version(), self.kind(), self.namespace(), self.name())
    }

    /// Borrow the raw document.
    #[must_use]
    pub const fn content(&self) -> &Map<String, Value> {
        &self.content
    }

    /// Clone the document as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.content.clone())
    }

    fn top_level_str(&self, field: &str) -> Option<&str> {
        self.content.get(field).and_then(Value::as_str)
    }

    fn metadata_str(&self, field: &str) -> Option<&str> {
        self.content
            .get(METADATA)
            .and_then(|metadata| metadata.get(field))
            .and_then(Value::as_str)
    }
}

const fn require(field: &'static str, value: Option<&str>) -> Result<(), ResourceError> {
    match value {
        Some(found) if !found.is_empty() => Ok(()),
        _ => Err(ResourceError::MissingField { field }),
    }
}

impl TryFrom<Value> for Resource {
    type Error = ResourceError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<Resource> for Value {
    fn from(resource: Resource) -> Self {
        Self::Object(resource.content)
    }
}
