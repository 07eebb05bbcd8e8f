//! Reclassification of operation outcomes by declared expectations.
//!
//! Expectations are consulted in declaration order and only the first one
//! whose `match` predicate holds decides the result. An expectation with
//! polarity [`Polarity::Failure`] turns an error outcome into success, which
//! is how a step declares that a create must be rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bindings::Bindings;
use crate::check::{Checker, join_mismatches};
use crate::error::OperationError;

/// Which outcome an expectation applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// The operation is expected to succeed.
    #[default]
    Success,
    /// The operation is expected to fail.
    Failure,
}

/// A declared rule about an operation's outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Expectation {
    /// Assertion tree selecting when this expectation applies.
    ///
    /// `None` makes the expectation a catch-all.
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub r#match: Option<Value>,

    /// Whether success or failure is expected.
    pub polarity: Polarity,

    /// Assertion tree the document must satisfy once this expectation
    /// applies. `$error` is bound while it is evaluated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<Value>,
}

impl Expectation {
    /// A catch-all expectation that the operation succeeds.
    #[must_use]
    pub const fn success() -> Self {
        Self {
            r#match: None,
            polarity: Polarity::Success,
            check: None,
        }
    }

    /// A catch-all expectation that the operation fails.
    #[must_use]
    pub const fn failure() -> Self {
        Self {
            r#match: None,
            polarity: Polarity::Failure,
            check: None,
        }
    }

    /// Restrict this expectation to documents matching `predicate`.
    #[must_use]
    pub fn with_match(mut self, predicate: Value) -> Self {
        self.r#match = Some(predicate);
        self
    }

    /// Require the document to satisfy `check` once this expectation applies.
    #[must_use]
    pub fn with_check(mut self, check: Value) -> Self {
        self.check = Some(check);
        self
    }

    fn decide(
        &self,
        checker: &dyn Checker,
        document: &Value,
        bindings: &Bindings,
        outcome: Result<(), OperationError>,
    ) -> Result<(), OperationError> {
        match (self.polarity, outcome) {
            (Polarity::Failure, Ok(())) => Err(OperationError::ExpectationMismatch {
                message: String::from("expected the operation to fail but it succeeded"),
            }),
            (Polarity::Success, Err(error)) => Err(error),
            (Polarity::Failure, Err(_)) | (Polarity::Success, Ok(())) => {
                self.run_check(checker, document, bindings)
            }
        }
    }

    fn run_check(
        &self,
        checker: &dyn Checker,
        document: &Value,
        bindings: &Bindings,
    ) -> Result<(), OperationError> {
        let Some(check) = &self.check else {
            return Ok(());
        };
        let mismatches = checker.check(document, bindings, check)?;
        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(OperationError::ExpectationMismatch {
                message: join_mismatches(&mismatches),
            })
        }
    }
}

/// The result of evaluating expectations against one outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Whether any expectation applied.
    pub matched: bool,
    /// The effective result.
    pub result: Result<(), OperationError>,
}

/// Decide the effective result of `outcome` under `expectations`.
///
/// A predicate that cannot be evaluated counts as matched and its error
/// becomes the result. When nothing matches, `outcome` stands unchanged.
#[must_use]
pub fn evaluate(
    checker: &dyn Checker,
    document: &Value,
    bindings: &Bindings,
    outcome: Result<(), OperationError>,
    expectations: &[Expectation],
) -> Verdict {
    for expectation in expectations {
        if let Some(predicate) = &expectation.r#match {
            match checker.check(document, bindings, predicate) {
                Ok(mismatches) if mismatches.is_empty() => {}
                Ok(_) => continue,
                Err(error) => {
                    return Verdict {
                        matched: true,
                        result: Err(error.into()),
                    };
                }
            }
        }
        return Verdict {
            matched: true,
            result: expectation.decide(checker, document, bindings, outcome),
        };
    }
    Verdict {
        matched: false,
        result: outcome,
    }
}
