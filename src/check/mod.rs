//! Assertion trees evaluated against JSON documents.
//!
//! An assertion tree is a JSON value describing what a document must look
//! like:
//!
//! - objects match as subsets, so unmentioned fields are ignored;
//! - a key written `(expr)` compares the expression's value, evaluated at
//!   the enclosing node, instead of a field;
//! - arrays compare element-wise and must have the same length;
//! - string leaves are rendered as templates before comparison;
//! - other scalars compare by equality.
//!
//! Mismatches are diagnostics, not errors. A [`CheckError`] means the tree
//! itself could not be evaluated.

use std::fmt;

use serde_json::Value;

use crate::bindings::Bindings;
use crate::error::CheckError;
use crate::expression::{self, values_equal};
use crate::template::{self, display_path, field_path, index_path};

/// One failed assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// Document path of the failing node.
    pub path: String,
    /// What differed.
    pub message: String,
}

impl Mismatch {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: display_path(path),
            message: message.into(),
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Join diagnostics into one message, separated by `; `.
#[must_use]
pub fn join_mismatches(mismatches: &[Mismatch]) -> String {
    mismatches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Evaluates an assertion tree against a document.
#[cfg_attr(test, mockall::automock)]
pub trait Checker: Send + Sync {
    /// Compare `document` with `expected`.
    ///
    /// Returns an empty vector when the document satisfies the tree.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckError`] when an expression or template in the tree
    /// cannot be evaluated.
    fn check(
        &self,
        document: &Value,
        bindings: &Bindings,
        expected: &Value,
    ) -> Result<Vec<Mismatch>, CheckError>;
}

/// The default check engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssertionTree;

impl Checker for AssertionTree {
    fn check(
        &self,
        document: &Value,
        bindings: &Bindings,
        expected: &Value,
    ) -> Result<Vec<Mismatch>, CheckError> {
        let mut walker = Walker {
            bindings,
            mismatches: Vec::new(),
        };
        walker.compare(document, expected, document, "")?;
        Ok(walker.mismatches)
    }
}

struct Walker<'a> {
    bindings: &'a Bindings,
    mismatches: Vec<Mismatch>,
}

impl Walker<'_> {
    fn compare(
        &mut self,
        actual: &Value,
        expected: &Value,
        current: &Value,
        path: &str,
    ) -> Result<(), CheckError> {
        match expected {
            Value::Object(fields) => {
                if !actual.is_object() {
                    self.type_mismatch(path, expected, actual);
                    return Ok(());
                }
                for (key, child) in fields {
                    self.compare_member(actual, key, child, path)?;
                }
                Ok(())
            }
            Value::Array(items) => {
                let Value::Array(elements) = actual else {
                    self.type_mismatch(path, expected, actual);
                    return Ok(());
                };
                if elements.len() != items.len() {
                    self.mismatches.push(Mismatch::new(
                        path,
                        format!(
                            "expected {} element(s), got {}",
                            items.len(),
                            elements.len()
                        ),
                    ));
                    return Ok(());
                }
                for (index, (element, item)) in elements.iter().zip(items).enumerate() {
                    self.compare(element, item, current, &index_path(path, index))?;
                }
                Ok(())
            }
            Value::String(text) => {
                let rendered = template::render_string(text, path, current, self.bindings)?;
                self.compare_leaf(actual, &rendered, path);
                Ok(())
            }
            scalar => {
                self.compare_leaf(actual, scalar, path);
                Ok(())
            }
        }
    }

    fn compare_member(
        &mut self,
        object: &Value,
        key: &str,
        expected: &Value,
        path: &str,
    ) -> Result<(), CheckError> {
        let child_path = field_path(path, key);
        if let Some(source) = projection(key) {
            let projected = expression::evaluate(source, object, self.bindings).map_err(
                |error| CheckError::Expression {
                    path: display_path(&child_path),
                    source: error,
                },
            )?;
            return self.compare(&projected, expected, object, &child_path);
        }
        match object.get(key) {
            Some(actual) => self.compare(actual, expected, object, &child_path),
            None if expected.is_null() => Ok(()),
            None => {
                self.mismatches
                    .push(Mismatch::new(&child_path, "field not found"));
                Ok(())
            }
        }
    }

    fn compare_leaf(&mut self, actual: &Value, expected: &Value, path: &str) {
        if !values_equal(actual, expected) {
            self.mismatches.push(Mismatch::new(
                path,
                format!("expected {expected}, got {actual}"),
            ));
        }
    }

    fn type_mismatch(&mut self, path: &str, expected: &Value, actual: &Value) {
        self.mismatches.push(Mismatch::new(
            path,
            format!(
                "expected {}, got {}",
                type_name(expected),
                type_name(actual)
            ),
        ));
    }
}

fn projection(key: &str) -> Option<&str> {
    key.strip_prefix('(').and_then(|rest| rest.strip_suffix(')'))
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
