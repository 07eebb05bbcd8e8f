//! Object and label selectors.
//!
//! An [`ObjectSelector`] narrows a set of resources by name, namespace and a
//! label selector expression such as `app=web,tier!=cache,!legacy`.
//!
//! Selectors are a store-side filter: [`crate::client::InMemoryStore::list`]
//! applies them when enumerating objects. Operations address objects by
//! [`super::ObjectKey`] and never select.

use serde::{Deserialize, Serialize};

use super::Resource;
use crate::error::ExpressionError;

/// One clause of a label selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelRequirement {
    /// `key=value` or `key==value`.
    Equals {
        /// Label key.
        key: String,
        /// Required value.
        value: String,
    },
    /// `key!=value`; also satisfied when the label is absent.
    NotEquals {
        /// Label key.
        key: String,
        /// Excluded value.
        value: String,
    },
    /// `key`: the label must be present.
    Exists {
        /// Label key.
        key: String,
    },
    /// `!key`: the label must be absent.
    DoesNotExist {
        /// Label key.
        key: String,
    },
}

impl LabelRequirement {
    /// Parse a comma-separated selector expression.
    ///
    /// # Errors
    ///
    /// Returns [`ExpressionError::Syntax`] for empty clauses or keys.
    pub fn parse_all(selector: &str) -> Result<Vec<Self>, ExpressionError> {
        if selector.trim().is_empty() {
            return Ok(Vec::new());
        }
        selector
            .split(',')
            .map(|clause| Self::parse(selector, clause.trim()))
            .collect()
    }

    fn parse(selector: &str, clause: &str) -> Result<Self, ExpressionError> {
        let syntax = |reason: &str| ExpressionError::Syntax {
            expression: String::from(selector),
            reason: String::from(reason),
        };

        if let Some((key, value)) = clause.split_once("!=") {
            return Ok(Self::NotEquals {
                key: non_empty_key(key).ok_or_else(|| syntax("empty label key"))?,
                value: String::from(value.trim()),
            });
        }
        if let Some((key, value)) = clause
            .split_once("==")
            .or_else(|| clause.split_once('='))
        {
            return Ok(Self::Equals {
                key: non_empty_key(key).ok_or_else(|| syntax("empty label key"))?,
                value: String::from(value.trim()),
            });
        }
        if let Some(key) = clause.strip_prefix('!') {
            return Ok(Self::DoesNotExist {
                key: non_empty_key(key).ok_or_else(|| syntax("empty label key"))?,
            });
        }
        non_empty_key(clause)
            .map(|key| Self::Exists { key })
            .ok_or_else(|| syntax("empty selector clause"))
    }

    /// Returns whether `resource`'s labels satisfy this clause.
    #[must_use]
    pub fn matches(&self, resource: &Resource) -> bool {
        let labels = resource.labels();
        match self {
            Self::Equals { key, value } => labels.get(key.as_str()) == Some(&value.as_str()),
            Self::NotEquals { key, value } => labels.get(key.as_str()) != Some(&value.as_str()),
            Self::Exists { key } => labels.contains_key(key.as_str()),
            Self::DoesNotExist { key } => !labels.contains_key(key.as_str()),
        }
    }
}

fn non_empty_key(raw: &str) -> Option<String> {
    let key = raw.trim();
    (!key.is_empty()).then(|| String::from(key))
}

/// Selects objects by name, namespace and labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectSelector {
    /// Exact object name.
    pub name: Option<String>,

    /// Exact namespace.
    pub namespace: Option<String>,

    /// Label selector expression.
    pub selector: Option<String>,
}

impl ObjectSelector {
    /// Returns whether `resource` satisfies every populated criterion.
    ///
    /// # Errors
    ///
    /// Returns [`ExpressionError::Syntax`] when the label selector is
    /// malformed.
    pub fn matches(&self, resource: &Resource) -> Result<bool, ExpressionError> {
        if self
            .name
            .as_deref()
            .is_some_and(|name| name != resource.name())
        {
            return Ok(false);
        }
        if self
            .namespace
            .as_deref()
            .is_some_and(|namespace| Some(namespace) != resource.namespace())
        {
            return Ok(false);
        }
        let requirements = self
            .selector
            .as_deref()
            .map(LabelRequirement::parse_all)
            .transpose()?
            .unwrap_or_default();
        Ok(requirements
            .iter()
            .all(|requirement| requirement.matches(resource)))
    }
}
