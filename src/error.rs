//! Semantic error types for kassert.
//!
//! This module defines the error hierarchy for the engine, following the
//! principle of using semantic error enums (via `thiserror`) for conditions
//! the caller might inspect or retry, while leaving opaque reporting
//! (`eyre::Report`) to whatever binary embeds the engine.
//!
//! The operation taxonomy separates configuration failures (never retried),
//! attempt failures (retried by the poll loop) and output failures (terminal
//! even after the underlying call succeeded).

use std::sync::Arc;

use thiserror::Error;

use crate::resource::ObjectKey;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be parsed.
    #[error("failed to parse configuration file: {message}")]
    ParseError {
        /// A description of the parse error.
        message: String,
    },

    /// A configuration value failed validation.
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// The name of the invalid field.
        field: String,
        /// The reason the value is invalid.
        reason: String,
    },

    /// The `OrthoConfig` library returned an error during configuration loading.
    #[error("configuration loading failed: {0}")]
    OrthoConfig(Arc<ortho_config::OrthoError>),
}

/// Errors raised when a JSON document is not a usable resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// The document is not a JSON object.
    #[error("resource document must be an object")]
    NotAnObject,

    /// A required identity field is absent or empty.
    #[error("resource document is missing required field '{field}'")]
    MissingField {
        /// Dotted path of the missing field.
        field: &'static str,
    },
}

/// Errors returned by a resource store client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The store holds no object with the requested identity.
    #[error("{key} not found")]
    NotFound {
        /// Identity of the missing object.
        key: ObjectKey,
    },

    /// The store rejected a create because the identity is taken.
    #[error("{key} already exists")]
    AlreadyExists {
        /// Identity of the conflicting object.
        key: ObjectKey,
    },

    /// Any other failed request.
    #[error("request failed: {message}")]
    Request {
        /// A description of the failure.
        message: String,
    },
}

impl ClientError {
    /// Returns whether this error is the store's not-found condition.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors raised while assigning a namespace to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamespaceError {
    /// The configured namespace is not a valid RFC 1123 label.
    #[error("invalid namespace '{namespace}': {reason}")]
    InvalidNamespace {
        /// The rejected namespace.
        namespace: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A cluster-scoped resource declared a namespace.
    #[error("{kind} is cluster scoped but declares namespace '{namespace}'")]
    ClusterScoped {
        /// The resource kind.
        kind: String,
        /// The namespace found on the document.
        namespace: String,
    },
}

/// Errors raised while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    /// The expression text is malformed.
    #[error("invalid expression '{expression}': {reason}")]
    Syntax {
        /// The expression text.
        expression: String,
        /// What the parser rejected.
        reason: String,
    },

    /// The expression references a binding that is not in scope.
    #[error("undefined binding '{name}'")]
    UndefinedBinding {
        /// The binding name, including its `$` prefix.
        name: String,
    },
}

/// Errors raised while rendering a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A placeholder was opened but never closed.
    #[error("unterminated placeholder in '{text}'")]
    Unterminated {
        /// The offending template string.
        text: String,
    },

    /// An embedded expression failed.
    #[error("failed to evaluate '{path}': {source}")]
    Expression {
        /// Document path of the template string.
        path: String,
        /// The underlying expression failure.
        source: ExpressionError,
    },

    /// The rendered document is no longer a valid resource.
    #[error("rendered document is invalid: {0}")]
    Resource(#[from] ResourceError),
}

/// Errors raised by a check engine that could not evaluate an assertion.
///
/// Mismatches are not errors; they are reported as diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    /// An assertion key or value held an invalid expression.
    #[error("failed to evaluate assertion at '{path}': {source}")]
    Expression {
        /// Document path of the assertion node.
        path: String,
        /// The underlying expression failure.
        source: ExpressionError,
    },

    /// A string leaf failed to render.
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Errors raised while extracting outputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputError {
    /// The output name is not a valid identifier.
    #[error("invalid output name '{name}': must match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// The gating predicate could not be evaluated.
    #[error("failed to evaluate match for output '{name}': {source}")]
    Check {
        /// The output name.
        name: String,
        /// The underlying check failure.
        source: CheckError,
    },

    /// The value template could not be rendered.
    #[error("failed to render output '{name}': {source}")]
    Render {
        /// The output name.
        name: String,
        /// The underlying template failure.
        source: TemplateError,
    },
}

/// Errors surfaced by an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// The resource template could not be rendered.
    #[error(transparent)]
    Render(TemplateError),

    /// The namespace policy rejected the resource.
    #[error(transparent)]
    Namespace(#[from] NamespaceError),

    /// The resource already exists in the store.
    #[error("the resource already exists in the cluster: {key}")]
    AlreadyExists {
        /// Identity of the existing object.
        key: ObjectKey,
    },

    /// A store request failed.
    #[error(transparent)]
    Store(ClientError),

    /// A declared expectation rejected the outcome.
    #[error("expectation failed: {message}")]
    ExpectationMismatch {
        /// The rendered diagnostics.
        message: String,
    },

    /// A check engine failed while evaluating an expectation.
    #[error(transparent)]
    Check(#[from] CheckError),

    /// Output extraction failed after the operation succeeded.
    #[error(transparent)]
    Output(#[from] OutputError),

    /// The operation was cancelled before any attempt completed.
    #[error("operation cancelled before completing an attempt")]
    Cancelled,
}

impl OperationError {
    /// Returns whether the error stops the poll loop under default policy.
    ///
    /// Configuration and output failures are terminal. Everything observed
    /// during an attempt, including an existing resource, is retried until
    /// the caller cancels.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Render(_) | Self::Namespace(_) | Self::Output(_) | Self::Cancelled
        )
    }
}

impl From<ClientError> for OperationError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::AlreadyExists { key } => Self::AlreadyExists { key },
            other => Self::Store(other),
        }
    }
}

/// Errors raised while running cleanup obligations.
#[derive(Debug, Error)]
pub enum CleanupError {
    /// One or more deletions failed.
    #[error("failed to clean up {} resource(s): {}", failures.len(), failures.join("; "))]
    Failed {
        /// One message per failed deletion.
        failures: Vec<String>,
    },

    /// Teardown was cancelled with obligations outstanding.
    #[error("cleanup cancelled with {remaining} resource(s) outstanding")]
    Cancelled {
        /// Obligations that were not attempted.
        remaining: usize,
    },
}

/// Top-level error type for kassert.
///
/// Aggregates the domain errors a caller of the library can receive from
/// the step driver and the configuration loader.
#[derive(Debug, Error)]
pub enum KassertError {
    /// An error occurred during configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An operation failed.
    #[error(transparent)]
    Operation(#[from] OperationError),

    /// Cleanup failed.
    #[error(transparent)]
    Cleanup(#[from] CleanupError),
}

/// A specialised `Result` type for kassert operations.
pub type Result<T> = std::result::Result<T, KassertError>;

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::Report;
    use rstest::{fixture, rstest};

    /// Fixture providing a sample object identity.
    #[fixture]
    fn widget_key() -> ObjectKey {
        ObjectKey::new("example.io/v1", "Widget", Some("default"), "w1")
    }

    #[rstest]
    fn already_exists_mentions_the_object(widget_key: ObjectKey) {
        let error = OperationError::AlreadyExists { key: widget_key };
        assert_eq!(
            error.to_string(),
            "the resource already exists in the cluster: Widget/default/w1"
        );
    }

    #[rstest]
    fn client_conflict_converts_to_already_exists(widget_key: ObjectKey) {
        let error = OperationError::from(ClientError::AlreadyExists {
            key: widget_key.clone(),
        });
        assert_eq!(error, OperationError::AlreadyExists { key: widget_key });
    }

    #[rstest]
    fn client_request_failure_converts_to_store_error() {
        let error = OperationError::from(ClientError::Request {
            message: String::from("connection refused"),
        });
        assert_eq!(error.to_string(), "request failed: connection refused");
        assert!(!error.is_terminal());
    }

    #[rstest]
    #[case(OperationError::Cancelled, true)]
    #[case(
        OperationError::Output(OutputError::InvalidName { name: String::from("1x") }),
        true
    )]
    #[case(
        OperationError::ExpectationMismatch { message: String::from("boom") },
        false
    )]
    #[case(
        OperationError::Namespace(NamespaceError::InvalidNamespace {
            namespace: String::from("Bad"),
            reason: String::from("uppercase"),
        }),
        true
    )]
    fn terminal_classification(#[case] error: OperationError, #[case] expected: bool) {
        assert_eq!(error.is_terminal(), expected);
    }

    #[rstest]
    fn already_exists_is_retried_by_default(widget_key: ObjectKey) {
        assert!(!OperationError::AlreadyExists { key: widget_key }.is_terminal());
    }

    #[rstest]
    fn output_error_invalid_name_displays_correctly() {
        let error = OutputError::InvalidName {
            name: String::from("my-output"),
        };
        assert_eq!(
            error.to_string(),
            "invalid output name 'my-output': must match [A-Za-z_][A-Za-z0-9_]*"
        );
    }

    #[rstest]
    fn cleanup_failed_lists_each_failure() {
        let error = CleanupError::Failed {
            failures: vec![String::from("a: denied"), String::from("b: timeout")],
        };
        assert_eq!(
            error.to_string(),
            "failed to clean up 2 resource(s): a: denied; b: timeout"
        );
    }

    #[rstest]
    fn config_error_invalid_value_displays_correctly() {
        let error = ConfigError::InvalidValue {
            field: String::from("KASSERT_SKIP_DELETE"),
            reason: String::from("expected bool (true/false), got 'maybe'"),
        };
        assert_eq!(
            error.to_string(),
            "invalid configuration value for 'KASSERT_SKIP_DELETE': expected bool (true/false), got 'maybe'"
        );
    }

    #[rstest]
    fn kassert_error_wraps_operation_error() {
        let error: KassertError = OperationError::Cancelled.into();
        assert_eq!(
            error.to_string(),
            "operation cancelled before completing an attempt"
        );
    }

    #[rstest]
    #[case(
        KassertError::from(OperationError::ExpectationMismatch {
            message: String::from("status.phase: expected Ready"),
        }),
        "expectation failed: status.phase: expected Ready"
    )]
    #[case(
        KassertError::from(CleanupError::Cancelled { remaining: 3 }),
        "cleanup cancelled with 3 resource(s) outstanding"
    )]
    fn eyre_report_preserves_error_messages(#[case] error: KassertError, #[case] expected: &str) {
        let report = Report::from(error);
        assert_eq!(report.to_string(), expected);
    }
}
